use docsynth::config::{KeyOrdering, SynthConfig};
use docsynth::document::{Body, Catalog, Document, Info};
use docsynth::synth::ModelOptions;
use docsynth::{Kind, TypeTable};
use serde_json::{json, Value};

const SHOP: &str = r#"{
    "types": [
        {"name": "Order", "fields": [
            {"name": "ID", "rename": "id", "type": "u64", "meta": "required:true;example:1001"},
            {"name": "status", "type": "String", "meta": "enum:open,paid,shipped;example:open"},
            {"name": "placed_at", "type": "DateTime<Utc>", "meta": "example:2024-05-01T10:00:00Z"},
            {"name": "lines", "type": "Vec<Line>", "meta": "required:true"},
            {"name": "customer", "type": "Option<Customer>"},
            {"name": "internal_note", "type": "String", "skip": true}
        ]},
        {"name": "Line", "fields": [
            {"name": "sku", "type": "String"},
            {"name": "qty", "type": "u32", "meta": "example:2"},
            {"name": "price", "type": "f64", "meta": "example:9.5"}
        ]},
        {"name": "Customer", "fields": [
            {"name": "name", "type": "String"},
            {"name": "referred_by", "type": "Option<Box<Customer>>"}
        ]}
    ]
}"#;

fn shop_document(ordering: KeyOrdering) -> (Document, TypeTable) {
    let table = TypeTable::from_json_str(SHOP).unwrap();
    assert!(table.unresolved().is_empty());

    let doc = Document::new("/docs")
        .with_info(Info { title: "Shop".into(), ..Info::default() })
        .with_config(SynthConfig::default().with_ordering(ordering));
    doc.add_response(&table, "GET", "/orders", 200, "all orders", Some(Body::json(Kind::parse("Vec<Order>").unwrap())));
    doc.add_response(&table, "GET", "/orders/{id}", 200, "one order", Some(Body::json(Kind::named("Order"))));
    doc.set_request_body(
        &table,
        "POST",
        "/orders",
        Body::json(Kind::named("Order")).with_options(ModelOptions::default().with_summary("new order")),
        true,
    );
    (doc, table)
}

#[test]
fn document_references_registered_components() {
    let (doc, _) = shop_document(KeyOrdering::Declaration);
    let v: Value = serde_json::from_str(&doc.encode(true).unwrap()).unwrap();

    assert_eq!(v["info"], json!({ "title": "Shop", "version": "1.0" }));
    assert_eq!(
        v["paths"]["/orders"]["get"]["responses"]["200"]["content"]["application/json"]["schema"],
        json!({ "type": "array", "items": { "oneOf": [{ "$ref": "#/components/schemas/Order" }] } })
    );
    assert_eq!(
        v["paths"]["/orders"]["post"]["requestBody"]["content"]["application/json"]["examples"],
        json!({ "Order": { "$ref": "#/components/examples/Order" } })
    );

    // the array body registered first, so its summary and list example stick
    let example = &v["components"]["examples"]["Order"];
    assert_eq!(example["summary"], "Order");
    assert_eq!(
        example["value"][0],
        json!({
            "id": 1001,
            "status": "open",
            "placed_at": "2024-05-01T10:00:00Z",
            "lines": [{ "sku": "string", "qty": 2, "price": 9.5 }],
            "customer": { "name": "string", "referred_by": { "name": "string", "referred_by": {} } }
        })
    );

    let schema = &v["components"]["schemas"]["Order"];
    assert_eq!(schema["required"], json!(["id", "lines"]));
    assert_eq!(schema["properties"]["status"]["enum"], json!(["open", "paid", "shipped"]));
    assert_eq!(schema["properties"]["placed_at"], json!({ "type": "string", "format": "date-time" }));
    assert_eq!(schema["properties"]["lines"]["items"]["properties"]["qty"]["format"], "int32");
    assert!(schema["properties"].get("internal_note").is_none());
}

#[test]
fn both_orderings_produce_the_same_text() {
    let (plain, _) = shop_document(KeyOrdering::Declaration);
    let (tokens, _) = shop_document(KeyOrdering::Tokens);

    let plain: Value = serde_json::from_str(&plain.encode(false).unwrap()).unwrap();
    let tokens_text = tokens.encode(false).unwrap();
    assert!(!tokens_text.contains("__"), "tokens left behind");
    let tokens: Value = serde_json::from_str(&tokens_text).unwrap();
    assert_eq!(plain, tokens);

    // field order inside the example follows declaration, not the alphabet
    let id = tokens_text.find(r#""id":1001"#).unwrap();
    let status = tokens_text.find(r#""status":"open""#).unwrap();
    let customer = tokens_text.find(r#""customer":{"#).unwrap();
    assert!(id < status && status < customer);
}

#[test]
fn catalog_serves_encoded_documents() {
    let catalog = Catalog::new();
    let (doc, _) = shop_document(KeyOrdering::Tokens);
    catalog.insert(doc);

    let text = catalog.encode("/docs", false).unwrap();
    let v: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["openapi"], "3.0.1");
    assert!(catalog.encode("/missing", false).is_err());
}
