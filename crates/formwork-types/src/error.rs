//! Error types for the Formwork data model.

use thiserror::Error;

/// Result type alias using the Formwork types error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing or validating form definitions.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid form definition: {0}")]
    InvalidDefinition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
