//! Declarative form configuration.
//!
//! Parses TOML form files into `FormConfig` structs and validates them. A
//! configuration names the form, its action controls, an optional autosubmit
//! policy, and the pipeline stage handlers — either left to inline
//! registration or referenced by dotted lookup name so that configuration can
//! be serialized before the implementing code is loaded.
//!
//! # Example TOML
//!
//! ```toml
//! [form]
//! form_id = "newsletter_signup"
//! title = "Subscribe"
//! debug = false
//!
//! [form.pipeline]
//! sanitize = "app.forms.signup.sanitize"
//! submit = "app.forms.signup.submit"
//!
//! [form.actions.submit]
//! role = "submit"
//! label = "Subscribe"
//!
//! [[form.actions.extra]]
//! role = "reset"
//! action = { type = "clear" }
//!
//! [form.autosubmit]
//! enabled = true
//! events = ["change"]
//! debounce_ms = 500
//! exclude_fields = ["promo_code"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::notification::NotificationKind;

/// Top-level wrapper matching the TOML structure `[form]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormConfigFile {
    pub form: FormConfig,
}

/// A complete declarative form configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormConfig {
    /// Unique form identifier, echoed on every outbound event.
    pub form_id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Icon name for the form shell header.
    #[serde(default)]
    pub icon: Option<String>,

    /// Layout hint for the form shell (e.g. "stacked", "inline").
    #[serde(default)]
    pub layout: Option<String>,

    /// Named pipeline stage handlers, resolved against a handler registry.
    #[serde(default)]
    pub pipeline: PipelineNames,

    /// Action control descriptors.
    #[serde(default)]
    pub actions: ActionsConfig,

    /// Debounced automatic submission policy.
    #[serde(default)]
    pub autosubmit: Option<AutosubmitConfig>,

    /// Verbose submission logging.
    #[serde(default)]
    pub debug: bool,
}

/// Dotted lookup names for the five pipeline stages.
///
/// Each name is resolved against the controller's handler registry; an inline
/// handler registered on the controller takes precedence over a name.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PipelineNames {
    #[serde(default)]
    pub sanitize: Option<String>,
    #[serde(default)]
    pub validate: Option<String>,
    #[serde(default)]
    pub submit: Option<String>,
    #[serde(default)]
    pub on_success: Option<String>,
    #[serde(default)]
    pub on_error: Option<String>,
}

/// Submit and extra action control descriptors.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionsConfig {
    #[serde(default)]
    pub submit: ActionDescriptor,
    #[serde(default)]
    pub extra: Vec<ExtraAction>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            submit: ActionDescriptor::default(),
            extra: Vec::new(),
        }
    }
}

/// The submit control descriptor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionDescriptor {
    /// Role tag used to locate the control in the rendered shell.
    #[serde(default = "default_submit_role")]
    pub role: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl Default for ActionDescriptor {
    fn default() -> Self {
        Self {
            role: default_submit_role(),
            label: None,
        }
    }
}

fn default_submit_role() -> String {
    "submit".to_string()
}

/// An extra action control and what clicking it does.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtraAction {
    /// Role tag used to locate the control in the rendered shell.
    pub role: String,
    #[serde(default)]
    pub label: Option<String>,
    pub action: ExtraActionKind,
}

/// What an extra action control does when clicked.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtraActionKind {
    /// Built-in: reset every field to its initial value.
    Clear,
    /// Built-in: serialize current values to text and emit a copy event.
    CopyValuesAsText,
    /// Host-supplied handler, resolved by dotted name.
    Handler { name: String },
}

/// Debounced automatic submission policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AutosubmitConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Notification kinds that arm the debounce timer.
    #[serde(default = "default_autosubmit_events")]
    pub events: Vec<NotificationKind>,

    /// Debounce delay in milliseconds. Zero disables scheduling entirely.
    #[serde(default)]
    pub debounce_ms: u64,

    /// Field ids whose notifications never arm the timer.
    #[serde(default)]
    pub exclude_fields: Vec<String>,
}

fn default_autosubmit_events() -> Vec<NotificationKind> {
    vec![NotificationKind::Change]
}

impl Default for AutosubmitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            events: default_autosubmit_events(),
            debounce_ms: 0,
            exclude_fields: Vec::new(),
        }
    }
}

impl AutosubmitConfig {
    /// Scheduling is an explicit opt-in: enabled with a nonzero delay.
    pub fn is_armed(&self) -> bool {
        self.enabled && self.debounce_ms > 0
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl FormConfigFile {
    /// Parse a form configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, Error> {
        let file: Self = toml::from_str(toml_str)
            .map_err(|e| Error::InvalidDefinition(format!("TOML parse error: {}", e)))?;
        file.form.validate()?;
        Ok(file)
    }

    /// Load a form configuration from a file path.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidDefinition(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }
}

impl FormConfig {
    /// Minimal configuration with defaults for everything but the id.
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            title: None,
            description: None,
            icon: None,
            layout: None,
            pipeline: PipelineNames::default(),
            actions: ActionsConfig::default(),
            autosubmit: None,
            debug: false,
        }
    }

    /// Validate structural invariants of the configuration.
    pub fn validate(&self) -> Result<(), Error> {
        if self.form_id.trim().is_empty() {
            return Err(Error::InvalidDefinition("form_id must not be empty".into()));
        }

        let mut roles = HashSet::new();
        roles.insert(self.actions.submit.role.as_str());
        for extra in &self.actions.extra {
            if extra.role.trim().is_empty() {
                return Err(Error::InvalidDefinition(
                    "extra action role must not be empty".into(),
                ));
            }
            if !roles.insert(extra.role.as_str()) {
                return Err(Error::InvalidDefinition(format!(
                    "duplicate action role: {}",
                    extra.role
                )));
            }
        }

        if let Some(autosubmit) = &self.autosubmit
            && autosubmit.enabled
            && autosubmit.events.is_empty()
        {
            return Err(Error::InvalidDefinition(
                "autosubmit.events must not be empty when enabled".into(),
            ));
        }

        Ok(())
    }
}
