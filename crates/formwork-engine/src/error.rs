//! Error types for the form engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, FormError>;

/// Errors that can occur during form engine operations.
#[derive(Debug, Error)]
pub enum FormError {
    /// Invalid form configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A named pipeline or action handler could not be resolved.
    #[error("No resolvable handler: {0}")]
    HandlerNotFound(String),

    /// An extra action handler failed.
    #[error("Action failed: {0}")]
    ActionFailed(String),

    /// No action is bound to the given role tag.
    #[error("Unknown action role: {0}")]
    UnknownAction(String),
}

impl From<formwork_types::Error> for FormError {
    fn from(err: formwork_types::Error) -> Self {
        FormError::Config(err.to_string())
    }
}
