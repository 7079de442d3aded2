//! Form-level and field-level status types.

use serde::{Deserialize, Serialize};

/// Visual status of a single field.
///
/// Fields own their status vocabulary; the engine only distinguishes the
/// well-known values it writes itself (`default`, `error`, `success`) and
/// passes everything else through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldStatus(String);

impl FieldStatus {
    pub fn error() -> Self {
        Self("error".to_string())
    }

    pub fn success() -> Self {
        Self("success".to_string())
    }

    pub fn is_error(&self) -> bool {
        self.0 == "error"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FieldStatus {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl From<&str> for FieldStatus {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The submission state machine's display states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatusKind {
    Idle,
    Validating,
    Submitting,
    Success,
    Error,
}

/// The single current display state of the whole form.
///
/// Exactly one `FormStatus` is live per controller instance; each pipeline
/// stage transition overwrites it atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormStatus {
    pub kind: FormStatusKind,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
}

impl FormStatus {
    pub fn idle() -> Self {
        Self {
            kind: FormStatusKind::Idle,
            message: None,
            details: Vec::new(),
        }
    }

    pub fn validating() -> Self {
        Self {
            kind: FormStatusKind::Validating,
            message: None,
            details: Vec::new(),
        }
    }

    pub fn submitting() -> Self {
        Self {
            kind: FormStatusKind::Submitting,
            message: None,
            details: Vec::new(),
        }
    }

    pub fn success(message: Option<String>) -> Self {
        Self {
            kind: FormStatusKind::Success,
            message,
            details: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            kind: FormStatusKind::Error,
            message: Some(message.into()),
            details,
        }
    }

    /// True while a submission cycle is running.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.kind, FormStatusKind::Validating | FormStatusKind::Submitting)
    }
}

impl Default for FormStatus {
    fn default() -> Self {
        Self::idle()
    }
}
