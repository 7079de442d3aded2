//! Submission orchestrator and controller facade.
//!
//! `FormController` owns one form's field registry, status, action bindings,
//! and autosubmit timer, and drives the staged submission protocol:
//!
//! ```text
//! idle → validating → submitting → {success | error} → idle
//! ```
//!
//! Stages run strictly sequentially; each user-supplied handler is awaited
//! before the next stage begins. A single in-flight flag guards against
//! re-entrant submissions: `submit()` while a cycle is running is a no-op.
//! Field notifications arriving mid-flight mutate the registry immediately
//! but only affect the next submission's snapshot. Nothing thrown by a
//! pipeline handler crosses the `submit()` boundary uncaught.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use formwork_types::config::FormConfig;
use formwork_types::event::{EventEnvelope, FormEvent};
use formwork_types::field::AggregatedState;
use formwork_types::notification::FieldNotification;
use formwork_types::status::{FormStatus, FormStatusKind};
use formwork_types::validation::ValidationResult;

use crate::actions::{ActionBinder, ActionControl, ActionRoute, ActionShell};
use crate::autosubmit::AutosubmitScheduler;
use crate::error::{FormError, Result};
use crate::handler::{ActionContext, HandlerRegistry, PipelineHandlers, StageContext};
use crate::registry::{FieldControl, FieldRegistry};
use crate::required::check_required;

/// How long the success visual stays up before reverting to idle.
const SUCCESS_REVERT: Duration = Duration::from_millis(1500);

/// Terminal outcome of one `submit()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submission was in flight; nothing ran.
    AlreadyInFlight,
    /// Required check or custom validation rejected the values.
    Invalid,
    /// The submit handler completed.
    Submitted,
    /// The submit handler failed or could not be resolved.
    Failed,
}

struct Inner {
    config: RwLock<FormConfig>,
    handlers: RwLock<PipelineHandlers>,
    handler_registry: HandlerRegistry,
    registry: Mutex<FieldRegistry>,
    status: Mutex<FormStatus>,
    in_flight: AtomicBool,
    events_tx: mpsc::UnboundedSender<EventEnvelope>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<EventEnvelope>>>,
    scheduler: Mutex<AutosubmitScheduler>,
    binder: Mutex<ActionBinder>,
    revert: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.scheduler.lock().cancel();
        if let Some(handle) = self.revert.lock().take() {
            handle.abort();
        }
    }
}

/// Releases the in-flight flag and the submit control's loading visual when
/// a submission ends, including when its future is dropped mid-flight.
struct FlightGuard<'a> {
    inner: &'a Inner,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(control) = self.inner.binder.lock().submit_control() {
            control.set_loading(false);
        }
        self.inner.in_flight.store(false, Ordering::SeqCst);
    }
}

/// One independent form instance.
///
/// Cloning is cheap and shares the same instance; the registry and status
/// are owned exclusively by it and never shared across instances.
#[derive(Clone)]
pub struct FormController {
    inner: Arc<Inner>,
}

impl FormController {
    /// Create a controller from a validated configuration.
    ///
    /// `handlers` supplies inline stage handlers; stages left unset fall back
    /// to the dotted names in `config.pipeline`, resolved against `registry`.
    pub fn new(
        config: FormConfig,
        handlers: PipelineHandlers,
        registry: HandlerRegistry,
    ) -> Result<Self> {
        config.validate()?;
        let handlers = handlers.merge_names(&config.pipeline);
        let scheduler = AutosubmitScheduler::new(config.autosubmit.clone().unwrap_or_default());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        info!(form_id = %config.form_id, "Form controller created");

        Ok(Self {
            inner: Arc::new(Inner {
                config: RwLock::new(config),
                handlers: RwLock::new(handlers),
                handler_registry: registry,
                registry: Mutex::new(FieldRegistry::new()),
                status: Mutex::new(FormStatus::idle()),
                in_flight: AtomicBool::new(false),
                events_tx,
                events_rx: Mutex::new(Some(events_rx)),
                scheduler: Mutex::new(scheduler),
                binder: Mutex::new(ActionBinder::new()),
                revert: Mutex::new(None),
            }),
        })
    }

    /// Replace the configuration and rebind actions against the shell.
    ///
    /// Inline stage handlers are kept; named stage references are rebuilt
    /// from the new configuration. Any pending autosubmit timer is cancelled.
    pub fn configure(&self, config: FormConfig, shell: &dyn ActionShell) -> Result<()> {
        config.validate()?;
        self.inner
            .scheduler
            .lock()
            .set_config(config.autosubmit.clone().unwrap_or_default());
        {
            let mut handlers = self.inner.handlers.write();
            *handlers = std::mem::take(&mut *handlers)
                .retain_inline()
                .merge_names(&config.pipeline);
        }
        self.inner.binder.lock().bind(&config.actions, shell);
        *self.inner.config.write() = config;
        Ok(())
    }

    /// Rebind action controls after the shell re-rendered.
    pub fn bind_actions(&self, shell: &dyn ActionShell) {
        let config = self.inner.config.read();
        self.inner.binder.lock().bind(&config.actions, shell);
    }

    /// Bind the owning widget for a field so reset and validation state can
    /// be pushed back onto it.
    pub fn bind_field_control(&self, field_id: &str, control: Arc<dyn FieldControl>) {
        self.inner.registry.lock().bind_control(field_id, control);
    }

    /// Feed a field notification into the controller.
    ///
    /// Accepted notifications update the registry (last-write-wins), are
    /// echoed outbound tagged with this form's id, and — when the autosubmit
    /// policy qualifies them — arm the debounce timer.
    pub fn notify(&self, notification: FieldNotification) {
        let accepted = self.inner.registry.lock().observe(&notification);
        if !accepted {
            return;
        }
        // observe() only accepts notifications that carry an id.
        let Some(field_id) = notification.field_id.clone() else {
            return;
        };

        let form_id = self.inner.config.read().form_id.clone();
        self.emit(EventEnvelope::new(
            form_id,
            FormEvent::Field {
                kind: notification.kind,
                field_id: field_id.clone(),
                value: notification.value.clone(),
            },
        ));

        let mut scheduler = self.inner.scheduler.lock();
        if scheduler.qualifies(notification.kind, &field_id) {
            let weak = Arc::downgrade(&self.inner);
            scheduler.schedule(move || async move {
                if let Some(inner) = weak.upgrade() {
                    FormController { inner }.submit().await;
                }
            });
        }
    }

    /// Run the submission pipeline.
    ///
    /// Re-entrant calls while a cycle is in flight return
    /// [`SubmitOutcome::AlreadyInFlight`] without side effects. The submit
    /// control's loading flag is cleared on every exit path.
    pub async fn submit(&self) -> SubmitOutcome {
        self.inner.scheduler.lock().cancel();

        if self.inner.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Submission already in flight, ignoring");
            return SubmitOutcome::AlreadyInFlight;
        }
        if let Some(handle) = self.inner.revert.lock().take() {
            handle.abort();
        }

        let guard = FlightGuard { inner: &self.inner };
        let submission_id = Uuid::new_v4();
        let outcome = self.run_pipeline(submission_id).await;
        drop(guard);

        if self.inner.config.read().debug {
            info!(%submission_id, ?outcome, "Submission finished");
        }
        outcome
    }

    async fn run_pipeline(&self, submission_id: Uuid) -> SubmitOutcome {
        let form_id = self.inner.config.read().form_id.clone();
        self.set_status(FormStatus::validating());
        if let Some(control) = self.submit_control() {
            control.set_loading(true);
            control.set_success(false);
        }

        // 1. Snapshot. Mutations after this point belong to the next cycle.
        let snapshot = self.inner.registry.lock().aggregated().values.clone();

        let handlers = self.inner.handlers.read().clone();
        let registry = &self.inner.handler_registry;

        // 2. Sanitize.
        let sanitized = match handlers.resolve_sanitize(registry) {
            Some(sanitize) => {
                match sanitize(StageContext::new(&form_id, snapshot.clone())).await {
                    Ok(Some(values)) => values,
                    Ok(None) => snapshot,
                    Err(e) => {
                        return self
                            .fail(submission_id, &form_id, snapshot, e.to_string(), &handlers)
                            .await;
                    }
                }
            }
            None => snapshot,
        };

        // 3. Required check, always before custom validation.
        let required = {
            let registry = self.inner.registry.lock();
            check_required(registry.records(), &sanitized)
        };
        if let Some(result) = required {
            debug!(%submission_id, "Required check failed");
            self.apply_result(&result);
            self.emit(
                EventEnvelope::new(&form_id, FormEvent::Invalid { result })
                    .with_submission(submission_id),
            );
            return SubmitOutcome::Invalid;
        }

        // 4. Custom validation.
        if let Some(validate) = handlers.resolve_validate(registry) {
            match validate(StageContext::new(&form_id, sanitized.clone())).await {
                Ok(Some(result)) => {
                    if !self.apply_result(&result) {
                        debug!(%submission_id, "Custom validation failed");
                        self.emit(
                            EventEnvelope::new(&form_id, FormEvent::Invalid { result })
                                .with_submission(submission_id),
                        );
                        return SubmitOutcome::Invalid;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    return self
                        .fail(submission_id, &form_id, sanitized, e.to_string(), &handlers)
                        .await;
                }
            }
        }

        // 5. Submit.
        self.set_status(FormStatus::submitting());
        let Some(submit) = handlers.resolve_submit(registry) else {
            let message = FormError::HandlerNotFound("submit".into()).to_string();
            return self
                .fail(submission_id, &form_id, sanitized, message, &handlers)
                .await;
        };

        match submit(StageContext::new(&form_id, sanitized.clone())).await {
            Ok(result) => {
                self.set_status(FormStatus::success(None));
                self.emit(
                    EventEnvelope::new(
                        &form_id,
                        FormEvent::Success {
                            values: sanitized.clone(),
                            result: result.clone(),
                        },
                    )
                    .with_submission(submission_id),
                );
                if let Some(on_success) = handlers.resolve_on_success(registry)
                    && let Err(e) =
                        on_success(StageContext::new(&form_id, sanitized).with_result(result)).await
                {
                    warn!(%submission_id, "on_success handler failed: {e}");
                }
                if let Some(control) = self.submit_control() {
                    control.set_success(true);
                }
                self.schedule_success_revert();
                SubmitOutcome::Submitted
            }
            Err(e) => {
                self.fail(submission_id, &form_id, sanitized, e.to_string(), &handlers)
                    .await
            }
        }
    }

    /// Route a submission failure: error status, outbound event, `on_error`.
    async fn fail(
        &self,
        submission_id: Uuid,
        form_id: &str,
        values: Map<String, Value>,
        message: String,
        handlers: &PipelineHandlers,
    ) -> SubmitOutcome {
        warn!(%submission_id, "Submission failed: {message}");
        self.set_status(FormStatus::error(message.clone(), Vec::new()));
        self.emit(
            EventEnvelope::new(
                form_id,
                FormEvent::Error {
                    message: message.clone(),
                },
            )
            .with_submission(submission_id),
        );
        if let Some(on_error) = handlers.resolve_on_error(&self.inner.handler_registry)
            && let Err(e) =
                on_error(StageContext::new(form_id, values).with_error(message)).await
        {
            warn!(%submission_id, "on_error handler failed: {e}");
        }
        SubmitOutcome::Failed
    }

    /// Apply a validation result onto fields and the form status.
    ///
    /// Field messages always land on the records; the form status is only
    /// overwritten when the result carries form messages, or when it is
    /// invalid (the state machine must leave `validating`).
    fn apply_result(&self, result: &ValidationResult) -> bool {
        let valid = self.inner.registry.lock().apply_validation(result);
        if let Some(form) = &result.form_messages {
            *self.inner.status.lock() = FormStatus {
                kind: if valid {
                    FormStatusKind::Success
                } else {
                    FormStatusKind::Error
                },
                message: form.message.clone(),
                details: form.details.clone(),
            };
        } else if !valid {
            *self.inner.status.lock() = FormStatus::error("Validation failed", Vec::new());
        }
        valid
    }

    /// Reset every field to its initial value and emit a clear event.
    pub fn reset(&self) {
        let values = self.inner.registry.lock().reset();
        let form_id = self.inner.config.read().form_id.clone();
        self.emit(EventEnvelope::new(form_id, FormEvent::Clear { values }));
    }

    /// Serialize the current values to pretty JSON and emit a copy event.
    pub fn copy_values_as_text(&self) -> String {
        let values = self.inner.registry.lock().aggregated().values.clone();
        let text = serde_json::to_string_pretty(&Value::Object(values)).unwrap_or_default();
        let form_id = self.inner.config.read().form_id.clone();
        self.emit(EventEnvelope::new(
            form_id,
            FormEvent::Copy { text: text.clone() },
        ));
        text
    }

    /// Deliver a click on an action control by role tag.
    pub async fn click(&self, role: &str) -> Result<()> {
        let route = self
            .inner
            .binder
            .lock()
            .route(role)
            .cloned()
            .ok_or_else(|| FormError::UnknownAction(role.to_string()))?;

        match route {
            ActionRoute::Submit => {
                self.submit().await;
                Ok(())
            }
            ActionRoute::Clear => {
                self.reset();
                Ok(())
            }
            ActionRoute::CopyValuesAsText => {
                self.copy_values_as_text();
                Ok(())
            }
            ActionRoute::Handler(name) => {
                let handler = self
                    .inner
                    .handler_registry
                    .action(&name)
                    .ok_or_else(|| FormError::HandlerNotFound(name.clone()))?;
                let ctx = ActionContext {
                    action_id: role.to_string(),
                    form_id: self.inner.config.read().form_id.clone(),
                    values: self.inner.registry.lock().aggregated().values.clone(),
                };
                handler(ctx)
                    .await
                    .map_err(|e| FormError::ActionFailed(e.to_string()))
            }
        }
    }

    /// The current form status.
    pub fn status(&self) -> FormStatus {
        self.inner.status.lock().clone()
    }

    /// The current aggregated field snapshot.
    pub fn aggregated(&self) -> AggregatedState {
        self.inner.registry.lock().aggregated().clone()
    }

    /// Take the outbound event receiver. Yields `None` after the first call.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<EventEnvelope>> {
        self.inner.events_rx.lock().take()
    }

    /// Cancel pending timers. Also runs on drop of the last clone.
    pub fn shutdown(&self) {
        self.inner.scheduler.lock().cancel();
        if let Some(handle) = self.inner.revert.lock().take() {
            handle.abort();
        }
    }

    fn submit_control(&self) -> Option<Arc<dyn ActionControl>> {
        self.inner.binder.lock().submit_control()
    }

    fn set_status(&self, status: FormStatus) {
        debug!(kind = ?status.kind, "Form status");
        *self.inner.status.lock() = status;
    }

    fn emit(&self, envelope: EventEnvelope) {
        // Receiver may be gone; outbound events are best-effort.
        let _ = self.inner.events_tx.send(envelope);
    }

    /// After a success, flip back to idle once the UI has shown it.
    fn schedule_success_revert(&self) {
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(SUCCESS_REVERT).await;
            if let Some(inner) = weak.upgrade() {
                {
                    let mut status = inner.status.lock();
                    // A newer cycle owns the status now; leave it alone.
                    if status.kind == FormStatusKind::Success {
                        *status = FormStatus::idle();
                    }
                }
                if let Some(control) = inner.binder.lock().submit_control() {
                    control.set_success(false);
                }
            }
        });
        let mut revert = self.inner.revert.lock();
        if let Some(previous) = revert.replace(handle) {
            previous.abort();
        }
    }
}
