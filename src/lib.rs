//! Schema and example synthesis for API description documents.
//!
//! A model is described field by field ([`descriptor`]), walked once by the
//! [`synth::Synthesizer`] into a schema tree and a matching example tree
//! ([`node`]), registered as a component ([`registry`]) and referenced from
//! operations of a [`document::Document`].
pub mod config;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod logging;
pub mod node;
pub mod path_de;
pub mod registry;
pub mod synth;
pub mod table;

pub use config::{GuardPolicy, KeyOrdering, RepeatedEnum, SynthConfig};
pub use descriptor::{Describe, FieldDescriptor, Kind, NoTable, Resolve, TypeDescriptor, TypeRef};
pub use document::{Body, Catalog, Document, Info, Server};
pub use error::{Error, Result};
pub use node::{ExampleNode, Literal, SchemaNode};
pub use registry::{Registration, SchemaRegistry};
pub use synth::{Container, ModelOptions, Primitive, Synthesis, Synthesizer};
pub use table::TypeTable;
