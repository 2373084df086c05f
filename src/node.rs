//! Output trees: the schema node and the example node that mirrors it.
//!
//! Both use `IndexMap` for object members so declaration order survives all
//! the way to the encoded text. Emission to `serde_json::Value` happens here
//! and nowhere else.
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";
pub const EXAMPLE_REF_PREFIX: &str = "#/components/examples/";

// -------------------------------- Scalars --------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Integer,
    Number,
    Boolean,
    String,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::String => "string",
        }
    }
}

/// A typed literal: an example value or an enum candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Int(i64),
    UInt(u64),
    Float(OrderedFloat<f64>),
    Bool(bool),
    Str(String),
}

impl Literal {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::UInt(u) => Value::from(*u),
            Self::Float(f) => serde_json::Number::from_f64(f.0)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Bool(b) => Value::from(*b),
            Self::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self { Self::Str(s.to_string()) }
}

// -------------------------------- Schema ---------------------------------- //

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object(ObjectSchema),
    Array(ArraySchema),
    Primitive(PrimitiveSchema),
    Ref(RefSchema),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, SchemaNode>,
    /// Plain keys (never tokenized), declaration order, no duplicates.
    pub required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: Box<SchemaNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSchema {
    pub tag: TypeTag,
    pub format: Option<String>,
    pub enum_: Vec<Literal>,
}

/// Reference to registered schemas; more than one target reads as `oneOf`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefSchema {
    pub one_of: Vec<String>,
}

impl SchemaNode {
    pub fn array_of(items: SchemaNode) -> Self {
        Self::Array(ArraySchema { items: Box::new(items) })
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self::Ref(RefSchema { one_of: vec![target.into()] })
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Object(o) => o.to_json(),
            Self::Array(a) => json!({ "type": "array", "items": a.items.to_json() }),
            Self::Primitive(p) => {
                let mut o = json!({ "type": p.tag.as_str() });
                if let Some(format) = &p.format {
                    o["format"] = Value::from(format.as_str());
                }
                if !p.enum_.is_empty() {
                    o["enum"] = Value::Array(p.enum_.iter().map(Literal::to_json).collect());
                }
                o
            }
            Self::Ref(r) => {
                let arms = r.one_of.iter()
                    .map(|name| json!({ "$ref": format!("{SCHEMA_REF_PREFIX}{name}") }))
                    .collect::<Vec<_>>();
                json!({ "oneOf": arms })
            }
        }
    }
}

impl ObjectSchema {
    pub fn is_empty(&self) -> bool { self.properties.is_empty() }

    pub fn require(&mut self, key: &str) {
        if !self.required.iter().any(|k| k == key) {
            self.required.push(key.to_string());
        }
    }

    pub fn to_json(&self) -> Value {
        let mut o = Map::new();
        o.insert("type".into(), Value::from("object"));
        if !self.properties.is_empty() {
            let props = self.properties.iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<Map<_, _>>();
            o.insert("properties".into(), Value::Object(props));
        }
        if !self.required.is_empty() {
            o.insert(
                "required".into(),
                Value::Array(self.required.iter().cloned().map(Value::from).collect()),
            );
        }
        Value::Object(o)
    }
}

impl From<ObjectSchema> for SchemaNode {
    fn from(o: ObjectSchema) -> Self { Self::Object(o) }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(s)
    }
}

// -------------------------------- Example --------------------------------- //

/// Sample payload. Arrays hold one representative element.
#[derive(Debug, Clone, PartialEq)]
pub enum ExampleNode {
    Object(IndexMap<String, ExampleNode>),
    Array(Box<ExampleNode>),
    Scalar(Literal),
}

impl ExampleNode {
    pub fn empty_object() -> Self { Self::Object(IndexMap::new()) }

    pub fn array_of(element: ExampleNode) -> Self { Self::Array(Box::new(element)) }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Object(fields) => Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Self::Array(el) => Value::Array(vec![el.to_json()]),
            Self::Scalar(lit) => lit.to_json(),
        }
    }
}

impl Serialize for ExampleNode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(s)
    }
}

// ------------------------------- Invariants ------------------------------- //

/// True when `example` has exactly the shape `schema` describes: same member
/// keys in every object, arrays against arrays, scalars against primitives.
pub fn isomorphic(schema: &SchemaNode, example: &ExampleNode) -> bool {
    match (schema, example) {
        (SchemaNode::Object(o), ExampleNode::Object(fields)) => {
            o.properties.len() == fields.len()
                && o.properties.iter().all(|(k, s)| {
                    fields.get(k).is_some_and(|e| isomorphic(s, e))
                })
        }
        (SchemaNode::Array(a), ExampleNode::Array(el)) => isomorphic(&a.items, el),
        (SchemaNode::Primitive(_), ExampleNode::Scalar(_)) => true,
        // the target lives elsewhere in the document
        (SchemaNode::Ref(_), _) => true,
        _ => false,
    }
}
