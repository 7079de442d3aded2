//! Field state registry.
//!
//! Maintains one authoritative `FieldRecord` per field identity, built
//! incrementally from field notifications, and the `AggregatedState` derived
//! from them. Records are created lazily on first observation and never
//! removed; a reset restores them to their initial values.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use formwork_types::field::{AggregatedState, FieldMessages, FieldRecord, FieldSummary};
use formwork_types::notification::FieldNotification;
use formwork_types::status::FieldStatus;
use formwork_types::validation::ValidationResult;

/// Engine-side view of a field widget.
///
/// The registry holds a copy of reported state, not a live binding; this
/// trait is the only path by which the engine reaches back into a widget,
/// and only to push values and validation state for re-rendering.
pub trait FieldControl: Send + Sync {
    fn set_value(&self, value: &Value);
    fn set_validation(&self, status: &FieldStatus, messages: Option<&FieldMessages>);
}

struct BoundField {
    record: FieldRecord,
    control: Option<Arc<dyn FieldControl>>,
    /// A value-bearing notification has been observed; the record's
    /// `initial_value` is fixed.
    seen_value: bool,
}

/// One controller instance's field state, in first-observation order.
#[derive(Default)]
pub struct FieldRegistry {
    fields: Vec<BoundField>,
    aggregated: AggregatedState,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a field notification.
    ///
    /// Creates a record on first observation of a `field_id`, then merges
    /// only the keys present in the notification — absent keys are untouched,
    /// `value` is last-write-wins. The first value-bearing notification fixes
    /// the record's initial value, whether or not it created the record (a
    /// control may be bound before the field ever reports). Recomputes the
    /// aggregated state before returning.
    ///
    /// A notification without a `field_id` is a contract violation by the
    /// widget; it is dropped and logged, never surfaced to the host.
    pub fn observe(&mut self, notification: &FieldNotification) -> bool {
        let Some(field_id) = notification.field_id.as_deref() else {
            warn!(kind = %notification.kind, "Dropping field notification without field_id");
            return false;
        };

        let idx = match self.position(field_id) {
            Some(idx) => idx,
            None => {
                debug!(field_id, "Registering field");
                self.fields.push(BoundField {
                    record: FieldRecord::new(field_id),
                    control: None,
                    seen_value: false,
                });
                self.fields.len() - 1
            }
        };

        let bound = &mut self.fields[idx];
        let record = &mut bound.record;
        if let Some(name) = &notification.name {
            record.name = name.clone();
        }
        if let Some(value) = &notification.value {
            if !bound.seen_value {
                record.initial_value = value.clone();
                bound.seen_value = true;
            }
            record.value = value.clone();
        }
        if let Some(status) = &notification.status {
            record.status = status.clone();
        }
        if let Some(messages) = &notification.messages {
            record.messages = Some(messages.clone());
        }
        if let Some(required) = notification.required {
            record.required = required;
        }
        if let Some(touched) = notification.touched {
            record.touched = touched;
        }
        if let Some(dirty) = notification.dirty {
            record.dirty = dirty;
        }
        if notification.kind.marks_dirty() {
            record.dirty = true;
        }
        if notification.kind.marks_touched() {
            record.touched = true;
        }

        self.recompute();
        true
    }

    /// Bind the owning control for a field, creating the record if needed.
    pub fn bind_control(&mut self, field_id: &str, control: Arc<dyn FieldControl>) {
        let idx = match self.position(field_id) {
            Some(idx) => idx,
            None => {
                self.fields.push(BoundField {
                    record: FieldRecord::new(field_id),
                    control: None,
                    seen_value: false,
                });
                self.fields.len() - 1
            }
        };
        self.fields[idx].control = Some(control);
    }

    /// Restore every record to its initial value and push the reset state
    /// back onto the owning widgets. Returns the reset value map.
    pub fn reset(&mut self) -> Map<String, Value> {
        for bound in &mut self.fields {
            bound.record.reset();
            if let Some(control) = &bound.control {
                control.set_value(&bound.record.value);
                control.set_validation(&bound.record.status, None);
            }
        }
        self.recompute();
        self.aggregated.values.clone()
    }

    /// Apply a validation result onto field records and their widgets.
    /// Idempotent; returns the result's overall validity.
    pub fn apply_validation(&mut self, result: &ValidationResult) -> bool {
        for (field_id, validation) in &result.field_messages {
            if let Some(idx) = self.position(field_id) {
                let bound = &mut self.fields[idx];
                bound.record.status = validation.status.clone();
                bound.record.messages = validation.messages.clone();
                if let Some(control) = &bound.control {
                    control.set_validation(&validation.status, validation.messages.as_ref());
                }
            }
        }
        self.recompute();
        result.is_valid()
    }

    /// The current aggregated snapshot. Always consistent with the records
    /// as of the last mutation; never a partial view.
    pub fn aggregated(&self) -> &AggregatedState {
        &self.aggregated
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldRecord> {
        self.position(field_id).map(|idx| &self.fields[idx].record)
    }

    pub fn records(&self) -> impl Iterator<Item = &FieldRecord> {
        self.fields.iter().map(|bound| &bound.record)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn position(&self, field_id: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|bound| bound.record.field_id == field_id)
    }

    fn recompute(&mut self) {
        let mut values = Map::new();
        let mut summaries = Vec::with_capacity(self.fields.len());
        for bound in &self.fields {
            values.insert(bound.record.name.clone(), bound.record.value.clone());
            summaries.push(FieldSummary::from(&bound.record));
        }
        self.aggregated = AggregatedState {
            values,
            fields: summaries,
        };
    }
}
