//! Shared types for the Formwork form orchestration engine.
//!
//! This crate holds the serde-first data model shared between the engine and
//! its hosts: field notifications and records, aggregated form state, the
//! form status machine's display states, validation results, outbound event
//! envelopes, and the declarative form configuration.

pub mod config;
pub mod error;
pub mod event;
pub mod field;
pub mod notification;
pub mod status;
pub mod validation;

pub use config::{
    ActionDescriptor, ActionsConfig, AutosubmitConfig, ExtraAction, ExtraActionKind, FormConfig,
    FormConfigFile, PipelineNames,
};
pub use error::{Error, Result};
pub use event::{EventEnvelope, FormEvent};
pub use field::{AggregatedState, FieldMessages, FieldRecord, FieldSummary};
pub use notification::{FieldNotification, NotificationKind};
pub use status::{FieldStatus, FormStatus, FormStatusKind};
pub use validation::{FieldValidation, FormMessages, ValidationResult};
