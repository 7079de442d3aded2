//! Validation results produced by the required-field check and by custom
//! validators, and the rule deciding their overall validity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::field::FieldMessages;
use crate::status::FieldStatus;

/// Status and messages to apply to one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValidation {
    pub status: FieldStatus,
    #[serde(default)]
    pub messages: Option<FieldMessages>,
}

impl FieldValidation {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: FieldStatus::error(),
            messages: Some(FieldMessages::error(message)),
        }
    }
}

/// Form-level message block of a validation result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormMessages {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
}

/// Outcome of a validation stage.
///
/// Validity rule: an explicit `valid` flag always wins. When the flag is
/// absent, the result is invalid if any field message carries the `error`
/// status, valid otherwise. Applying a result is idempotent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default)]
    pub field_messages: BTreeMap<String, FieldValidation>,
    #[serde(default)]
    pub form_messages: Option<FormMessages>,
}

impl ValidationResult {
    /// An explicitly invalid result with a form-level message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: Some(false),
            field_messages: BTreeMap::new(),
            form_messages: Some(FormMessages {
                message: Some(message.into()),
                details: Vec::new(),
            }),
        }
    }

    /// Attach an error-status message for one field.
    pub fn with_field_error(
        mut self,
        field_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.field_messages
            .insert(field_id.into(), FieldValidation::error(message));
        self
    }

    /// Attach a form-level detail line.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.form_messages
            .get_or_insert_with(FormMessages::default)
            .details
            .push(detail.into());
        self
    }

    /// Overall validity of this result.
    pub fn is_valid(&self) -> bool {
        match self.valid {
            Some(v) => v,
            None => !self
                .field_messages
                .values()
                .any(|fv| fv.status.is_error()),
        }
    }
}
