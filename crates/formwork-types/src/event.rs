//! Outbound notifications produced by a form controller.
//!
//! These are consumed by the host page, analytics, or other collaborators.
//! Every event is wrapped in an envelope carrying the controller's `form_id`,
//! the submission cycle id where one applies, and a timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::notification::NotificationKind;
use crate::validation::ValidationResult;

/// A single outbound notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FormEvent {
    /// All fields were reset to their initial values.
    Clear { values: serde_json::Map<String, Value> },
    /// Current values were copied as text.
    Copy { text: String },
    /// A submission attempt failed validation.
    Invalid { result: ValidationResult },
    /// A submission completed successfully.
    Success {
        values: serde_json::Map<String, Value>,
        result: Value,
    },
    /// A submission failed.
    Error { message: String },
    /// Per-field echo of an accepted field notification.
    Field {
        kind: NotificationKind,
        field_id: String,
        #[serde(default)]
        value: Option<Value>,
    },
}

/// Envelope around an outbound event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub form_id: String,
    /// Present for events tied to one submission cycle.
    #[serde(default)]
    pub submission_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: FormEvent,
}

impl EventEnvelope {
    pub fn new(form_id: impl Into<String>, event: FormEvent) -> Self {
        Self {
            form_id: form_id.into(),
            submission_id: None,
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn with_submission(mut self, submission_id: Uuid) -> Self {
        self.submission_id = Some(submission_id);
        self
    }
}
