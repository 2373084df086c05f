//! Schema + example synthesis from model descriptors.
//!
//! One walk produces both trees at once so they cannot drift apart: every
//! field inserts a schema property and an example member under the same key.
//!
//! - Fields are visited in declaration order; `skip` fields are left out.
//! - Objects recurse through the navigation guard, which cuts cycles by
//!   returning an empty object (`{"type":"object"}` / `{}`).
//! - Arrays hold one representative element in the example.
//! - Nothing here fails: bad literals fall back to defaults, cycles truncate,
//!   unknown types are reported in the result instead of raised.
pub mod annotation;
pub mod coerce;
pub mod guard;
pub mod token;

use indexmap::IndexMap;

use crate::config::{KeyOrdering, SynthConfig};
use crate::descriptor::{Kind, Resolve, TypeDescriptor, TypeRef};
use crate::node::{ExampleNode, ObjectSchema, PrimitiveSchema, SchemaNode};

pub use annotation::Annotation;
pub use coerce::Primitive;
pub use guard::NavigationGuard;
pub use token::{OrderToken, TokenMinter};

// -------------------------------- Types ----------------------------------- //

/// Whether a model is documented as one object or as a list of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Container {
    #[default]
    Object,
    Array,
}

/// Caller-supplied naming for a model.
#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    /// Name for anonymous models; ignored when the descriptor has a name.
    pub type_name: Option<String>,
    /// Example summary; defaults to the model name.
    pub summary: Option<String>,
}

/// Output of one top-level synthesis call.
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Schema registry key.
    pub name: String,
    pub container: Container,
    /// Always the object schema of the model itself, even for `Array`.
    pub schema: SchemaNode,
    /// Wrapped in a one-element array for `Array`.
    pub example: ExampleNode,
    /// Tokens that must be stripped from the encoded document.
    pub tokens: Vec<OrderToken>,
    /// Types whose expansion the guard cut off.
    pub truncated: Vec<String>,
    /// Named references with no descriptor.
    pub unresolved: Vec<String>,
}

/// What walking one type yields: its object schema and matching example.
#[derive(Debug, Clone)]
struct Walk {
    schema: ObjectSchema,
    example: ExampleNode,
}

pub struct Synthesizer<'a> {
    config: &'a SynthConfig,
    table: &'a dyn Resolve,
}

struct Walker<'a> {
    config: &'a SynthConfig,
    table: &'a dyn Resolve,
    guard: NavigationGuard,
    minter: Option<TokenMinter>,
    truncated: Vec<String>,
    unresolved: Vec<String>,
}

// ---------------------------- Implementation ------------------------------ //

impl ModelOptions {
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

impl Synthesis {
    /// False when part of the model was cut or could not be resolved.
    pub fn is_complete(&self) -> bool {
        self.truncated.is_empty() && self.unresolved.is_empty()
    }
}

impl Walk {
    fn empty(container: Container) -> Self {
        Self { schema: ObjectSchema::default(), example: wrap(ExampleNode::empty_object(), container) }
    }
}

impl<'a> Synthesizer<'a> {
    pub fn new(config: &'a SynthConfig, table: &'a dyn Resolve) -> Self {
        Self { config, table }
    }

    pub fn config(&self) -> &SynthConfig { self.config }

    /// Synthesize a model given as a type expression: an object, or an array
    /// (through any pointers) of objects. Anything else documents nothing
    /// and yields `None`.
    pub fn synthesize_kind(&self, kind: &Kind, options: &ModelOptions) -> Option<Synthesis> {
        let (r, container) = match kind.deref() {
            Kind::Object(r) => (r, Container::Object),
            Kind::Array(elem) => match elem.deref() {
                Kind::Object(r) => (r, Container::Array),
                other => {
                    tracing::debug!(?other, "array of non-object model; nothing to synthesize");
                    return None;
                }
            },
            other => {
                tracing::debug!(?other, "non-object model; nothing to synthesize");
                return None;
            }
        };
        let Some(ty) = r.resolve(self.table) else {
            tracing::warn!(?r, "model type has no descriptor");
            return None;
        };
        self.synthesize(&ty, options, container)
    }

    pub fn synthesize(
        &self,
        ty: &TypeDescriptor,
        options: &ModelOptions,
        container: Container,
    ) -> Option<Synthesis> {
        let name = if !ty.is_anonymous() {
            ty.name.clone()
        } else {
            match options.type_name.as_deref().map(str::trim) {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => {
                    tracing::warn!("anonymous model without a type name; skipped");
                    return None;
                }
            }
        };

        let _span = tracing::debug_span!("synthesize", model = %name).entered();
        let mut walker = Walker::new(self.config, self.table);
        let walk = walker.walk(ty, &name, container);

        let Walker { minter, truncated, unresolved, .. } = walker;
        if !truncated.is_empty() || !unresolved.is_empty() {
            tracing::debug!(?truncated, ?unresolved, "partial synthesis");
        }
        Some(Synthesis {
            name,
            container,
            schema: SchemaNode::Object(walk.schema),
            example: walk.example,
            tokens: minter.map(TokenMinter::into_tokens).unwrap_or_default(),
            truncated,
            unresolved,
        })
    }
}

impl<'a> Walker<'a> {
    fn new(config: &'a SynthConfig, table: &'a dyn Resolve) -> Self {
        let minter = match config.ordering {
            KeyOrdering::Declaration => None,
            KeyOrdering::Tokens => Some(TokenMinter::new(config.token_pad_width)),
        };
        Self {
            config,
            table,
            guard: NavigationGuard::new(config.depth_bound, config.guard),
            minter,
            truncated: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// Walk `ty`; `owner` names it when it is anonymous.
    fn walk(&mut self, ty: &TypeDescriptor, owner: &str, container: Container) -> Walk {
        let type_name = if ty.is_anonymous() { owner } else { ty.name.as_str() };

        let walk = if self.guard.enter(type_name) {
            let (schema, example) = self.expand(ty);
            Walk { schema, example: wrap(example, container) }
        } else {
            tracing::debug!(
                type_name,
                visits = self.guard.visits(type_name),
                "navigation guard cut expansion"
            );
            if !self.truncated.iter().any(|t| t == type_name) {
                self.truncated.push(type_name.to_string());
            }
            Walk::empty(container)
        };
        self.guard.leave(type_name);
        walk
    }

    fn expand(&mut self, ty: &TypeDescriptor) -> (ObjectSchema, ExampleNode) {
        let mut schema = ObjectSchema::default();
        let mut example = IndexMap::new();
        let mut seen = Vec::<&str>::with_capacity(ty.fields.len());

        for (seq, field) in ty.fields.iter().enumerate() {
            if field.skip {
                continue;
            }
            let key = field.key();
            if seen.contains(&key) {
                tracing::warn!(type_name = %ty.name, key, "duplicate field key; later field ignored");
                continue;
            }
            seen.push(key);

            let working_key = match self.minter.as_mut() {
                Some(minter) => minter.mint(seq).prefix(key),
                None => key.to_string(),
            };

            let ann = Annotation::parse(&field.meta, self.config.enum_clauses);
            if ann.required {
                schema.require(key);
            }

            let (field_schema, field_example) = self.field(&field.kind, &ann, key);
            schema.properties.insert(working_key.clone(), field_schema);
            example.insert(working_key, field_example);
        }

        (schema, ExampleNode::Object(example))
    }

    fn field(&mut self, kind: &Kind, ann: &Annotation, key: &str) -> (SchemaNode, ExampleNode) {
        match kind {
            Kind::Pointer(inner) => self.field(inner, ann, key),
            Kind::Primitive(p) => {
                let schema = SchemaNode::Primitive(PrimitiveSchema {
                    tag: p.tag(),
                    format: p.format().map(str::to_string),
                    enum_: p.convert_enum(&ann.enum_),
                });
                let example = ExampleNode::Scalar(p.example_or_default(ann.example.as_deref()));
                (schema, example)
            }
            Kind::Array(elem) => {
                let (items, element) = self.field(elem, ann, key);
                (SchemaNode::array_of(items), ExampleNode::array_of(element))
            }
            Kind::Object(r) => {
                let walk = self.object(r, key);
                (SchemaNode::Object(walk.schema), walk.example)
            }
        }
    }

    fn object(&mut self, r: &TypeRef, owner: &str) -> Walk {
        match r.resolve(self.table) {
            Some(ty) => self.walk(&ty, owner, Container::Object),
            None => {
                let name = match r {
                    TypeRef::Named(name) => name.clone(),
                    TypeRef::Lazy(_) => owner.to_string(),
                };
                tracing::warn!(type_name = %name, field = owner, "no descriptor for nested type");
                if !self.unresolved.contains(&name) {
                    self.unresolved.push(name);
                }
                Walk::empty(Container::Object)
            }
        }
    }
}

fn wrap(example: ExampleNode, container: Container) -> ExampleNode {
    match container {
        Container::Object => example,
        Container::Array => ExampleNode::array_of(example),
    }
}

// ------------------------------- Tests ------------------------------------ //
