//! Library error type.
//!
//! Synthesis itself never fails (malformed annotations, cycles and unsupported
//! inputs all degrade to defaults); these variants cover the edges where real
//! input comes in or a finished document goes out.
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Decode failure with the JSON path where it happened.
    #[error("at JSON path {path} → {message}")]
    Decode { path: String, message: String },

    #[error("invalid type expression `{expr}`: {reason}")]
    TypeExpr { expr: String, reason: String },

    #[error("type `{0}` is declared more than once")]
    DuplicateType(String),

    #[error("no model named `{0}`")]
    UnknownModel(String),

    #[error("no document registered under `{0}`")]
    DocumentNotFound(String),

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn type_expr(expr: &str, reason: impl Into<String>) -> Self {
        Self::TypeExpr { expr: expr.to_string(), reason: reason.into() }
    }
}
