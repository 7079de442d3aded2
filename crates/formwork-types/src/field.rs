//! Field records and the aggregated form state derived from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::FieldStatus;

/// Structured per-field messages, keyed by severity (`error`, `warning`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMessages(pub BTreeMap<String, Vec<String>>);

impl FieldMessages {
    /// A single error-severity message.
    pub fn error(message: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert("error".to_string(), vec![message.into()]);
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty() || self.0.values().all(|v| v.is_empty())
    }

    pub fn get(&self, severity: &str) -> Option<&Vec<String>> {
        self.0.get(severity)
    }
}

/// One authoritative record per field identity.
///
/// Created lazily on the first notification for an unseen `field_id` and
/// never removed; an explicit reset restores it to its initial value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRecord {
    pub field_id: String,
    /// Submission key. Defaults to `field_id`; never unset after first
    /// observation.
    pub name: String,
    /// Most recent reported value, last-write-wins.
    pub value: Value,
    /// Value captured on first observation; restored by reset.
    pub initial_value: Value,
    pub status: FieldStatus,
    #[serde(default)]
    pub messages: Option<FieldMessages>,
    /// Value committed at least once (change/blur).
    pub touched: bool,
    /// Value changed via any input notification.
    pub dirty: bool,
    pub required: bool,
}

impl FieldRecord {
    pub fn new(field_id: impl Into<String>) -> Self {
        let field_id = field_id.into();
        Self {
            name: field_id.clone(),
            field_id,
            value: Value::Null,
            initial_value: Value::Null,
            status: FieldStatus::default(),
            messages: None,
            touched: false,
            dirty: false,
            required: false,
        }
    }

    /// Restore the record to its initial observation state.
    pub fn reset(&mut self) {
        self.value = self.initial_value.clone();
        self.status = FieldStatus::default();
        self.messages = None;
        self.touched = false;
        self.dirty = false;
    }
}

/// Read-only summary of one field, as exposed in `AggregatedState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field_id: String,
    pub name: String,
    pub value: Value,
    pub status: FieldStatus,
    pub touched: bool,
    pub dirty: bool,
    pub required: bool,
}

impl From<&FieldRecord> for FieldSummary {
    fn from(record: &FieldRecord) -> Self {
        Self {
            field_id: record.field_id.clone(),
            name: record.name.clone(),
            value: record.value.clone(),
            status: record.status.clone(),
            touched: record.touched,
            dirty: record.dirty,
            required: record.required,
        }
    }
}

/// Derived snapshot of the whole registry, recomputed after every mutation.
///
/// Never exposes a partial view: `values` and `fields` are always consistent
/// with each other at the point of recomputation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatedState {
    /// Map of submission key → current value.
    pub values: serde_json::Map<String, Value>,
    /// Ordered field summaries, in first-observation order.
    pub fields: Vec<FieldSummary>,
}
