//! API description document: info, servers, paths and the component store,
//! plus the catalog that hands finished documents out by key.
//!
//! Bodies attached to operations are registered as components and referenced
//! from the operation's content, never inlined.
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::{KeyOrdering, SynthConfig};
use crate::descriptor::{Kind, Resolve, TypeDescriptor};
use crate::error::{Error, Result};
use crate::node::{RefSchema, SchemaNode, EXAMPLE_REF_PREFIX};
use crate::registry::{Registration, SchemaRegistry};
use crate::synth::{token, Container, ModelOptions, Synthesizer};

pub const DEFAULT_OPENAPI: &str = "3.0.1";
pub const DEFAULT_TITLE: &str = "DocApi";
pub const DEFAULT_VERSION: &str = "1.0";
pub const JSON_CONTENT: &str = "application/json";
const DEFAULT_RESPONSE: &str = "default";

// --------------------------------- Info ----------------------------------- //

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct License {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.into(),
            version: DEFAULT_VERSION.into(),
            description: None,
            contact: None,
            license: None,
        }
    }
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), description: None }
    }
}

// ------------------------------ Operations -------------------------------- //

/// A model attached to a request or response.
#[derive(Debug, Clone)]
pub struct Body {
    pub kind: Kind,
    pub options: ModelOptions,
    pub content_type: String,
}

impl Body {
    pub fn json(kind: Kind) -> Self {
        Self { kind, options: ModelOptions::default(), content_type: JSON_CONTENT.into() }
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

#[derive(Debug, Clone, Default)]
struct Content {
    schema: Option<SchemaNode>,
    /// Registered example names referenced from this content.
    examples: Vec<String>,
}

#[derive(Debug, Clone)]
struct Response {
    description: String,
    content: IndexMap<String, Content>,
    /// The stand-in every new operation starts with.
    placeholder: bool,
}

#[derive(Debug, Clone)]
struct RequestBody {
    required: bool,
    content: IndexMap<String, Content>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    request_body: Option<RequestBody>,
    responses: IndexMap<String, Response>,
}

impl Content {
    fn attach(&mut self, reg: &Registration) {
        let name = reg.name.as_str();
        let schema = self.schema.get_or_insert_with(|| match reg.container {
            Container::Object => SchemaNode::Ref(RefSchema::default()),
            Container::Array => SchemaNode::array_of(SchemaNode::Ref(RefSchema::default())),
        });
        let target = match (schema, reg.container) {
            (SchemaNode::Ref(r), Container::Object) => Some(r),
            (SchemaNode::Array(a), Container::Array) => match a.items.as_mut() {
                SchemaNode::Ref(r) => Some(r),
                _ => None,
            },
            _ => None,
        };
        match target {
            Some(r) if !r.one_of.iter().any(|n| n == name) => r.one_of.push(name.to_string()),
            Some(_) => {}
            None => tracing::debug!(model = name, "content holds a different container; schema left as is"),
        }
        if !self.examples.iter().any(|n| n == name) {
            self.examples.push(name.to_string());
        }
    }

    fn to_json(&self) -> Value {
        let mut o = Map::new();
        if let Some(schema) = &self.schema {
            o.insert("schema".into(), schema.to_json());
        }
        if !self.examples.is_empty() {
            let examples = self.examples.iter()
                .map(|n| (n.clone(), json!({ "$ref": format!("{EXAMPLE_REF_PREFIX}{n}") })))
                .collect::<Map<_, _>>();
            o.insert("examples".into(), Value::Object(examples));
        }
        Value::Object(o)
    }
}

fn content_json(content: &IndexMap<String, Content>) -> Value {
    Value::Object(content.iter().map(|(ct, c)| (ct.clone(), c.to_json())).collect())
}

impl Operation {
    fn new() -> Self {
        let placeholder = Response {
            description: "Default".into(),
            content: IndexMap::new(),
            placeholder: true,
        };
        Self {
            request_body: None,
            responses: IndexMap::from([(DEFAULT_RESPONSE.to_string(), placeholder)]),
        }
    }

    fn to_json(&self) -> Value {
        let mut o = Map::new();
        if let Some(body) = &self.request_body {
            o.insert(
                "requestBody".into(),
                json!({ "required": body.required, "content": content_json(&body.content) }),
            );
        }
        let responses = self.responses.iter()
            .map(|(code, r)| {
                let mut resp = json!({ "description": r.description });
                if !r.content.is_empty() {
                    resp["content"] = content_json(&r.content);
                }
                (code.clone(), resp)
            })
            .collect::<Map<_, _>>();
        o.insert("responses".into(), Value::Object(responses));
        Value::Object(o)
    }
}

/// Response map key for an HTTP status; anything outside 100..=599 is `default`.
pub fn status_key(status: u16) -> String {
    if (100..=599).contains(&status) {
        status.to_string()
    } else {
        DEFAULT_RESPONSE.to_string()
    }
}

// ------------------------------- Document --------------------------------- //

#[derive(Debug)]
pub struct Document {
    key: String,
    openapi: String,
    info: Info,
    servers: Vec<Server>,
    external_docs: Option<ExternalDocs>,
    config: SynthConfig,
    /// path -> lower-cased method -> operation
    paths: RwLock<IndexMap<String, IndexMap<String, Operation>>>,
    components: SchemaRegistry,
}

impl Document {
    /// `key` is the path the document is served under in a [`Catalog`].
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            openapi: DEFAULT_OPENAPI.into(),
            info: Info::default(),
            servers: Vec::new(),
            external_docs: None,
            config: SynthConfig::default(),
            paths: RwLock::new(IndexMap::new()),
            components: SchemaRegistry::new(),
        }
    }

    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    pub fn with_external_docs(mut self, docs: ExternalDocs) -> Self {
        self.external_docs = Some(docs);
        self
    }

    pub fn with_config(mut self, config: SynthConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_openapi(mut self, version: impl Into<String>) -> Self {
        self.openapi = version.into();
        self
    }

    pub fn key(&self) -> &str { &self.key }

    pub fn info(&self) -> &Info { &self.info }

    pub fn config(&self) -> &SynthConfig { &self.config }

    pub fn components(&self) -> &SchemaRegistry { &self.components }

    /// Register a model as a component without attaching it anywhere.
    pub fn register(&self, table: &dyn Resolve, kind: &Kind, options: &ModelOptions) -> Option<Registration> {
        let synth = Synthesizer::new(&self.config, table);
        self.components.add_model(kind, options, &synth)
    }

    pub fn register_descriptor(
        &self,
        table: &dyn Resolve,
        ty: &TypeDescriptor,
        options: &ModelOptions,
    ) -> Option<Registration> {
        let synth = Synthesizer::new(&self.config, table);
        self.components.add_descriptor(ty, options, Container::Object, &synth)
    }

    /// Add (or extend) the response for `status`. A body that documents
    /// nothing still creates the response, just without content.
    pub fn add_response(
        &self,
        table: &dyn Resolve,
        method: &str,
        path: &str,
        status: u16,
        description: &str,
        body: Option<Body>,
    ) -> Option<Registration> {
        let registration = body.as_ref()
            .and_then(|b| self.register(table, &b.kind, &b.options));

        let code = status_key(status);
        let mut paths = self.paths.write();
        let op = operation(&mut paths, method, path);
        op.responses.retain(|_, r| !r.placeholder);
        let response = op.responses.entry(code).or_insert_with(|| Response {
            description: description.to_string(),
            content: IndexMap::new(),
            placeholder: false,
        });
        if let (Some(body), Some(reg)) = (&body, &registration) {
            response.content.entry(body.content_type.clone()).or_default().attach(reg);
        }
        registration
    }

    pub fn set_request_body(
        &self,
        table: &dyn Resolve,
        method: &str,
        path: &str,
        body: Body,
        required: bool,
    ) -> Option<Registration> {
        let registration = self.register(table, &body.kind, &body.options);

        let mut paths = self.paths.write();
        let op = operation(&mut paths, method, path);
        let request = op.request_body.get_or_insert_with(|| RequestBody {
            required,
            content: IndexMap::new(),
        });
        request.required = required;
        if let Some(reg) = &registration {
            request.content.entry(body.content_type).or_default().attach(reg);
        }
        registration
    }

    pub fn to_json(&self) -> Value {
        let mut o = Map::new();
        o.insert("openapi".into(), Value::from(self.openapi.as_str()));
        o.insert("info".into(), json!(self.info));
        if !self.servers.is_empty() {
            o.insert("servers".into(), json!(self.servers));
        }
        if let Some(docs) = &self.external_docs {
            o.insert("externalDocs".into(), json!(docs));
        }
        let paths = self.paths.read().iter()
            .map(|(path, ops)| {
                let ops = ops.iter()
                    .map(|(method, op)| (method.clone(), op.to_json()))
                    .collect::<Map<_, _>>();
                (path.clone(), Value::Object(ops))
            })
            .collect::<Map<_, _>>();
        o.insert("paths".into(), Value::Object(paths));
        let components = self.components.to_json();
        if components.as_object().is_some_and(|c| !c.is_empty()) {
            o.insert("components".into(), components);
        }
        Value::Object(o)
    }

    /// Final document text. In token mode keys are emitted sorted and every
    /// recorded token is removed afterwards.
    pub fn encode(&self, pretty: bool) -> Result<String> {
        let value = self.to_json();
        match self.config.ordering {
            KeyOrdering::Declaration => render(&value, pretty),
            KeyOrdering::Tokens => {
                let text = render(&sort_keys(value), pretty)?;
                Ok(token::strip(&text, &self.components.tokens()))
            }
        }
    }
}

fn operation<'p>(
    paths: &'p mut IndexMap<String, IndexMap<String, Operation>>,
    method: &str,
    path: &str,
) -> &'p mut Operation {
    paths.entry(path.to_string())
        .or_default()
        .entry(method.to_lowercase())
        .or_insert_with(Operation::new)
}

fn render(value: &Value, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// Rebuild every object with lexicographically ordered keys.
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries = map.into_iter().collect::<Vec<_>>();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

// -------------------------------- Catalog --------------------------------- //

/// Documents by key, shared with whatever serves them.
#[derive(Debug, Default)]
pub struct Catalog {
    docs: RwLock<IndexMap<String, Arc<Document>>>,
}

impl Catalog {
    pub fn new() -> Self { Self::default() }

    /// Store `doc` under its key, replacing any earlier document there.
    pub fn insert(&self, doc: Document) -> Arc<Document> {
        let doc = Arc::new(doc);
        if self.docs.write().insert(doc.key.clone(), Arc::clone(&doc)).is_some() {
            tracing::debug!(key = %doc.key, "replaced document");
        }
        doc
    }

    pub fn find(&self, key: &str) -> Result<Arc<Document>> {
        match self.docs.read().get(key) {
            Some(doc) => Ok(Arc::clone(doc)),
            None => {
                tracing::error!(key, "document not found");
                Err(Error::DocumentNotFound(key.to_string()))
            }
        }
    }

    pub fn encode(&self, key: &str, pretty: bool) -> Result<String> {
        self.find(key)?.encode(pretty)
    }

    pub fn keys(&self) -> Vec<String> {
        self.docs.read().keys().cloned().collect()
    }
}
