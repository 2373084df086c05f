//! Component store: registered schemas and their named examples.
//!
//! A schema and its example are written under one lock acquisition, so a
//! reader never sees one without the other. Synthesis runs outside the lock.
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};

use crate::descriptor::{Kind, TypeDescriptor};
use crate::node::{ExampleNode, SchemaNode};
use crate::synth::{Container, ModelOptions, OrderToken, Synthesis, Synthesizer};

#[derive(Debug, Clone, PartialEq)]
pub struct NamedExample {
    pub summary: String,
    pub value: ExampleNode,
    /// Order tokens minted while synthesizing `value` (and its schema).
    pub tokens: Vec<OrderToken>,
    /// No recursion cut and no unresolved reference went into `value`.
    pub complete: bool,
}

/// Outcome of one `add_model` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub container: Container,
    /// False when the name was already taken and nothing was stored.
    pub inserted: bool,
    /// Completeness of the component stored under `name`. When the name was
    /// already taken this is the earlier entry's, not the skipped model's.
    pub complete: bool,
}

#[derive(Debug, Default)]
struct Inner {
    schemas: IndexMap<String, SchemaNode>,
    examples: IndexMap<String, NamedExample>,
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    inner: RwLock<Inner>,
}

impl SchemaRegistry {
    pub fn new() -> Self { Self::default() }

    /// Synthesize and register the model behind a type expression. Returns
    /// `None` when the kind documents nothing (primitives, arrays of
    /// primitives, unknown or anonymous-unnamed models).
    pub fn add_model(
        &self,
        kind: &Kind,
        options: &ModelOptions,
        synth: &Synthesizer<'_>,
    ) -> Option<Registration> {
        let synthesis = synth.synthesize_kind(kind, options)?;
        Some(self.insert(synthesis, options))
    }

    pub fn add_descriptor(
        &self,
        ty: &TypeDescriptor,
        options: &ModelOptions,
        container: Container,
        synth: &Synthesizer<'_>,
    ) -> Option<Registration> {
        if !ty.is_anonymous() {
            let stored = self.inner.read().examples.get(&ty.name).map(|e| e.complete);
            if let Some(complete) = stored {
                tracing::debug!(model = %ty.name, "already registered; skipped");
                return Some(Registration { name: ty.name.clone(), container, inserted: false, complete });
            }
        }
        let synthesis = synth.synthesize(ty, options, container)?;
        Some(self.insert(synthesis, options))
    }

    /// Store a finished synthesis. Lets callers synthesize in parallel and
    /// still register in a fixed order.
    pub fn insert(&self, synthesis: Synthesis, options: &ModelOptions) -> Registration {
        let complete = synthesis.is_complete();
        let Synthesis { name, container, schema, example, tokens, .. } = synthesis;
        let mut inner = self.inner.write();

        // first registration of a name wins
        if let Some(stored) = inner.examples.get(&name) {
            tracing::debug!(model = %name, "already registered; skipped");
            return Registration { name, container, inserted: false, complete: stored.complete };
        }

        // array bodies keep the wrapped example so it matches the content schema
        let summary = options.summary.clone().unwrap_or_else(|| name.clone());
        inner.schemas.insert(name.clone(), schema);
        inner.examples.insert(name.clone(), NamedExample { summary, value: example, tokens, complete });
        tracing::debug!(model = %name, complete, "registered");

        Registration { name, container, inserted: true, complete }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().schemas.contains_key(name)
    }

    pub fn schema(&self, name: &str) -> Option<SchemaNode> {
        self.inner.read().schemas.get(name).cloned()
    }

    pub fn example(&self, name: &str) -> Option<NamedExample> {
        self.inner.read().examples.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.read().schemas.keys().cloned().collect()
    }

    pub fn len(&self) -> usize { self.inner.read().schemas.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Every token recorded by every registered example.
    pub fn tokens(&self) -> Vec<OrderToken> {
        self.inner.read()
            .examples
            .values()
            .flat_map(|e| e.tokens.iter().cloned())
            .collect()
    }

    /// `components` object: `schemas` and `examples`, empty members omitted.
    pub fn to_json(&self) -> Value {
        let inner = self.inner.read();
        let mut out = Map::new();
        if !inner.schemas.is_empty() {
            let schemas = inner.schemas.iter()
                .map(|(name, schema)| (name.clone(), schema.to_json()))
                .collect::<Map<_, _>>();
            out.insert("schemas".into(), Value::Object(schemas));
        }
        if !inner.examples.is_empty() {
            let examples = inner.examples.iter()
                .map(|(name, ex)| {
                    (name.clone(), json!({ "summary": ex.summary, "value": ex.value.to_json() }))
                })
                .collect::<Map<_, _>>();
            out.insert("examples".into(), Value::Object(examples));
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyOrdering, SynthConfig};
    use crate::descriptor::{Describe, FieldDescriptor, NoTable};
    use crate::synth::Primitive;
    use crate::table::TypeTable;

    struct User;
    impl Describe for User {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::new("User")
                .field(FieldDescriptor::new("id", Kind::primitive(Primitive::I64)).meta("required:true;example:7"))
                .field(FieldDescriptor::new("name", Kind::primitive(Primitive::String)))
        }
    }

    #[test]
    fn registers_schema_and_example_together() {
        let cfg = SynthConfig::default();
        let synth = Synthesizer::new(&cfg, &NoTable);
        let reg = SchemaRegistry::new();

        let r = reg.add_model(&Kind::object::<User>(), &ModelOptions::default(), &synth).unwrap();
        assert_eq!(r.name, "User");
        assert!(r.inserted && r.complete);
        assert_eq!(reg.example("User").unwrap().summary, "User");
        assert_eq!(
            reg.to_json(),
            json!({
                "schemas": { "User": {
                    "type": "object",
                    "properties": { "id": { "type": "integer", "format": "int64" }, "name": { "type": "string" } },
                    "required": ["id"]
                }},
                "examples": { "User": { "summary": "User", "value": { "id": 7, "name": "string" } } }
            })
        );
    }

    #[test]
    fn array_models_store_a_list_example() {
        let cfg = SynthConfig::default();
        let synth = Synthesizer::new(&cfg, &NoTable);
        let reg = SchemaRegistry::new();
        let opts = ModelOptions::default().with_summary("all users");

        let r = reg.add_model(&Kind::array(Kind::object::<User>()), &opts, &synth).unwrap();
        assert_eq!(r.container, Container::Array);
        let ex = reg.example("User").unwrap();
        assert_eq!(ex.summary, "all users");
        assert_eq!(ex.value.to_json(), json!([{ "id": 7, "name": "string" }]));
        assert_eq!(reg.schema("User").unwrap().to_json()["type"], "object");
    }

    #[test]
    fn first_registration_wins() {
        let cfg = SynthConfig::default();
        let synth = Synthesizer::new(&cfg, &NoTable);
        let reg = SchemaRegistry::new();
        let other = TypeDescriptor::new("User").field(FieldDescriptor::new("x", Kind::primitive(Primitive::Bool)));

        assert!(reg.add_model(&Kind::object::<User>(), &ModelOptions::default(), &synth).unwrap().inserted);
        let again = reg.add_descriptor(&other, &ModelOptions::default(), Container::Object, &synth).unwrap();
        assert!(!again.inserted);
        assert_eq!(reg.len(), 1);
        assert!(reg.schema("User").unwrap().as_object().unwrap().properties.contains_key("id"));
    }

    #[test]
    fn skipped_registrations_report_the_stored_entry() {
        let table = TypeTable::from_descriptors([
            TypeDescriptor::new("Node").field(FieldDescriptor::new("next", Kind::pointer(Kind::named("Node")))),
        ])
        .unwrap();
        let whole = TypeDescriptor::new("Node").field(FieldDescriptor::new("v", Kind::primitive(Primitive::I32)));
        let cfg = SynthConfig::default();
        let synth = Synthesizer::new(&cfg, &table);
        let opts = ModelOptions::default();

        // stored entry is truncated; later complete candidates still report it
        let first = truncated_node(&synth, &table);
        let reg = SchemaRegistry::new();
        assert!(!reg.insert(first, &opts).complete);
        let early = reg.add_descriptor(&whole, &opts, Container::Object, &synth).unwrap();
        assert!(!early.inserted && !early.complete);
        let late = reg.insert(synth.synthesize(&whole, &opts, Container::Object).unwrap(), &opts);
        assert!(!late.inserted && !late.complete);
        assert!(!reg.example("Node").unwrap().complete);

        // and a complete stored entry stays complete against a truncated one
        let reg = SchemaRegistry::new();
        assert!(reg.add_descriptor(&whole, &opts, Container::Object, &synth).unwrap().complete);
        let late = reg.insert(truncated_node(&synth, &table), &opts);
        assert!(!late.inserted && late.complete);
    }

    fn truncated_node(synth: &Synthesizer<'_>, table: &TypeTable) -> Synthesis {
        let node = table.get("Node").unwrap();
        let out = synth.synthesize(node, &ModelOptions::default(), Container::Object).unwrap();
        assert!(!out.is_complete());
        out
    }

    #[test]
    fn primitives_register_nothing() {
        let cfg = SynthConfig::default();
        let synth = Synthesizer::new(&cfg, &NoTable);
        let reg = SchemaRegistry::new();
        assert!(reg.add_model(&Kind::primitive(Primitive::I32), &ModelOptions::default(), &synth).is_none());
        assert!(reg.is_empty());
        assert_eq!(reg.to_json(), json!({}));
    }

    #[test]
    fn tokens_are_collected_per_example() {
        let cfg = SynthConfig::default().with_ordering(KeyOrdering::Tokens);
        let synth = Synthesizer::new(&cfg, &NoTable);
        let reg = SchemaRegistry::new();
        reg.add_model(&Kind::object::<User>(), &ModelOptions::default(), &synth);
        assert_eq!(reg.tokens().len(), 2);
    }

    #[test]
    fn concurrent_registration_keeps_pairs_consistent() {
        let table = TypeTable::from_descriptors((0..32).map(|i| {
            TypeDescriptor::new(format!("M{i}"))
                .field(FieldDescriptor::new("v", Kind::primitive(Primitive::I32)))
        }))
        .unwrap();
        let cfg = SynthConfig::default();
        let synth = Synthesizer::new(&cfg, &table);
        let reg = SchemaRegistry::new();

        std::thread::scope(|s| {
            for t in 0..4 {
                let (reg, synth) = (&reg, &synth);
                s.spawn(move || {
                    // every thread registers every model; only one may win each name
                    for i in 0..32 {
                        let kind = Kind::named(format!("M{}", (i + t * 8) % 32));
                        reg.add_model(&kind, &ModelOptions::default(), synth);
                    }
                });
            }
        });

        assert_eq!(reg.len(), 32);
        for name in reg.names() {
            assert!(reg.example(&name).is_some());
        }
    }
}
