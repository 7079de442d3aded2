//! Field lifecycle notifications consumed by the engine.
//!
//! Field widgets are external collaborators: the engine never renders them and
//! never reaches into their internals. Everything the engine knows about a
//! field arrives as a `FieldNotification` — a tagged report of a lifecycle
//! event plus a partial payload of the field's current state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field::FieldMessages;
use crate::status::FieldStatus;

/// Lifecycle kind of a field notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Field rendered for the first time.
    Init,
    /// Field bound itself to a host form.
    Attach,
    /// Value changed via a raw input event.
    Input,
    /// Value committed (e.g. input lost focus after editing).
    Change,
    /// Option selected in a select-style field.
    Select,
    /// Option deselected in a select-style field.
    Deselect,
    /// Dropdown/picker opened.
    Open,
    /// Dropdown/picker closed.
    Close,
    /// Search query typed inside a searchable field.
    Search,
    /// Field lost focus.
    Blur,
    /// Field gained focus.
    Focus,
    /// Field ran its own local validation.
    Validation,
    /// Field value was cleared.
    Clear,
    /// Numeric field stepped up.
    Increment,
    /// Numeric field stepped down.
    Decrement,
}

impl NotificationKind {
    /// Kinds that mark a field as dirty (value changed via any input path).
    pub fn marks_dirty(self) -> bool {
        matches!(
            self,
            NotificationKind::Input
                | NotificationKind::Select
                | NotificationKind::Increment
                | NotificationKind::Decrement
        )
    }

    /// Kinds that mark a field as touched (value committed).
    pub fn marks_touched(self) -> bool {
        matches!(self, NotificationKind::Change | NotificationKind::Blur)
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::Init => "init",
            NotificationKind::Attach => "attach",
            NotificationKind::Input => "input",
            NotificationKind::Change => "change",
            NotificationKind::Select => "select",
            NotificationKind::Deselect => "deselect",
            NotificationKind::Open => "open",
            NotificationKind::Close => "close",
            NotificationKind::Search => "search",
            NotificationKind::Blur => "blur",
            NotificationKind::Focus => "focus",
            NotificationKind::Validation => "validation",
            NotificationKind::Clear => "clear",
            NotificationKind::Increment => "increment",
            NotificationKind::Decrement => "decrement",
        };
        write!(f, "{s}")
    }
}

/// A discrete report from a field widget.
///
/// `field_id` is the only key the engine treats as mandatory; a notification
/// without one is a contract violation by the widget and is dropped. All
/// other keys are optional and applied as partial merges onto the field's
/// record — absent keys leave the record untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldNotification {
    pub kind: NotificationKind,
    #[serde(default)]
    pub field_id: Option<String>,
    /// Submission key. Defaults to `field_id` on first observation.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    /// Unformatted value as the widget holds it (informational).
    #[serde(default)]
    pub raw_value: Option<Value>,
    /// Display-formatted rendition of the value (informational).
    #[serde(default)]
    pub formatted: Option<String>,
    #[serde(default)]
    pub status: Option<FieldStatus>,
    #[serde(default)]
    pub messages: Option<FieldMessages>,
    #[serde(default)]
    pub touched: Option<bool>,
    #[serde(default)]
    pub dirty: Option<bool>,
    #[serde(default)]
    pub required: Option<bool>,
}

impl FieldNotification {
    /// Create a notification for a field with no payload beyond identity.
    pub fn new(kind: NotificationKind, field_id: impl Into<String>) -> Self {
        Self {
            kind,
            field_id: Some(field_id.into()),
            name: None,
            value: None,
            raw_value: None,
            formatted: None,
            status: None,
            messages: None,
            touched: None,
            dirty: None,
            required: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_status(mut self, status: FieldStatus) -> Self {
        self.status = Some(status);
        self
    }
}
