//! Formwork engine: staged async form submission over a declarative
//! configuration.
//!
//! A host creates one [`FormController`] per rendered form. Field widgets
//! report their state changes as [`FieldNotification`]s; the controller
//! aggregates them into an authoritative registry, enforces required fields,
//! and drives the five-stage submission pipeline (`sanitize`, `validate`,
//! `submit`, `on_success`, `on_error`) supplied by the host, either inline or
//! resolved by dotted name from a [`HandlerRegistry`].
//!
//! ```no_run
//! use formwork_engine::handler::{submit_fn, HandlerRegistry, PipelineHandlers};
//! use formwork_engine::orchestrator::FormController;
//! use formwork_types::FormConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let handlers = PipelineHandlers::new().submit_fn(submit_fn(|ctx| async move {
//!     Ok(serde_json::json!({ "received": ctx.values.len() }))
//! }));
//! let controller =
//!     FormController::new(FormConfig::new("signup"), handlers, HandlerRegistry::new())?;
//! controller.submit().await;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod autosubmit;
pub mod error;
pub mod handler;
pub mod orchestrator;
pub mod registry;
pub mod required;

pub use actions::{ActionBinder, ActionControl, ActionRoute, ActionShell};
pub use autosubmit::AutosubmitScheduler;
pub use error::{FormError, Result};
pub use handler::{
    ActionContext, HandlerRegistry, PipelineHandlers, StageContext, StageRef,
};
pub use orchestrator::{FormController, SubmitOutcome};
pub use registry::{FieldControl, FieldRegistry};
pub use required::{check_required, is_missing_value};

pub use formwork_types::notification::FieldNotification;
