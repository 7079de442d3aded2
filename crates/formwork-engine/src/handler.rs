//! Pipeline stage handlers and their resolution.
//!
//! The five stages (`sanitize`, `validate`, `submit`, `on_success`,
//! `on_error`) are user-supplied async functions. Each can be configured
//! either inline or as a dotted lookup name (`"app.forms.signup.submit"`)
//! resolved against an explicit `HandlerRegistry` passed to the controller —
//! supporting configurations serialized before the implementing code is
//! registered, without a mutable global namespace.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};

use formwork_types::config::PipelineNames;
use formwork_types::validation::ValidationResult;

/// Boxed future type for stage handler results.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Context passed to every pipeline stage handler.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub form_id: String,
    /// Values as of this stage (raw snapshot for sanitize, sanitized after).
    pub values: Map<String, Value>,
    /// Submit handler result, set for `on_success`.
    pub result: Option<Value>,
    /// Failure message, set for `on_error`.
    pub error: Option<String>,
}

impl StageContext {
    pub fn new(form_id: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            form_id: form_id.into(),
            values,
            result: None,
            error: None,
        }
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Context passed to an extra action handler.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub action_id: String,
    pub form_id: String,
    pub values: Map<String, Value>,
}

/// Sanitize stage: may rewrite the value snapshot. Returning `None` keeps
/// the input unchanged.
pub type SanitizeFn =
    Arc<dyn Fn(StageContext) -> BoxFuture<anyhow::Result<Option<Map<String, Value>>>> + Send + Sync>;

/// Validate stage: `None` passes, `Some(result)` is applied to the form.
pub type ValidateFn =
    Arc<dyn Fn(StageContext) -> BoxFuture<anyhow::Result<Option<ValidationResult>>> + Send + Sync>;

/// Submit stage: produces an arbitrary result; an error signals failure.
pub type SubmitFn = Arc<dyn Fn(StageContext) -> BoxFuture<anyhow::Result<Value>> + Send + Sync>;

/// `on_success` / `on_error` stages: fire-and-forget notifications.
pub type NotifyFn = Arc<dyn Fn(StageContext) -> BoxFuture<anyhow::Result<()>> + Send + Sync>;

/// Extra action handler, invoked from the action binder.
pub type ActionFn = Arc<dyn Fn(ActionContext) -> BoxFuture<anyhow::Result<()>> + Send + Sync>;

/// Wrap a plain async closure as a [`SanitizeFn`].
pub fn sanitize_fn<F, Fut>(f: F) -> SanitizeFn
where
    F: Fn(StageContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<Map<String, Value>>>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Wrap a plain async closure as a [`ValidateFn`].
pub fn validate_fn<F, Fut>(f: F) -> ValidateFn
where
    F: Fn(StageContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<ValidationResult>>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Wrap a plain async closure as a [`SubmitFn`].
pub fn submit_fn<F, Fut>(f: F) -> SubmitFn
where
    F: Fn(StageContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Wrap a plain async closure as a [`NotifyFn`].
pub fn notify_fn<F, Fut>(f: F) -> NotifyFn
where
    F: Fn(StageContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Wrap a plain async closure as an [`ActionFn`].
pub fn action_fn<F, Fut>(f: F) -> ActionFn
where
    F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// A stage handler reference: a direct function or a name to resolve later.
#[derive(Clone)]
pub enum StageRef<F> {
    Inline(F),
    Named(String),
}

impl<F: Clone> StageRef<F> {
    fn resolve(&self, lookup: &HashMap<String, F>) -> Option<F> {
        match self {
            StageRef::Inline(f) => Some(f.clone()),
            StageRef::Named(name) => lookup.get(name).cloned(),
        }
    }
}

/// Named handlers available for resolution.
///
/// One map per handler shape; `on_success` and `on_error` share the notify
/// shape. The registry is read-only from the engine's perspective, so many
/// controllers may resolve from one registry without coordination.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    sanitize: HashMap<String, SanitizeFn>,
    validate: HashMap<String, ValidateFn>,
    submit: HashMap<String, SubmitFn>,
    notify: HashMap<String, NotifyFn>,
    actions: HashMap<String, ActionFn>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_sanitize(&mut self, name: impl Into<String>, f: SanitizeFn) -> &mut Self {
        self.sanitize.insert(name.into(), f);
        self
    }

    pub fn register_validate(&mut self, name: impl Into<String>, f: ValidateFn) -> &mut Self {
        self.validate.insert(name.into(), f);
        self
    }

    pub fn register_submit(&mut self, name: impl Into<String>, f: SubmitFn) -> &mut Self {
        self.submit.insert(name.into(), f);
        self
    }

    pub fn register_notify(&mut self, name: impl Into<String>, f: NotifyFn) -> &mut Self {
        self.notify.insert(name.into(), f);
        self
    }

    pub fn register_action(&mut self, name: impl Into<String>, f: ActionFn) -> &mut Self {
        self.actions.insert(name.into(), f);
        self
    }

    pub fn action(&self, name: &str) -> Option<ActionFn> {
        self.actions.get(name).cloned()
    }
}

/// The five optional stage handler references of one pipeline configuration.
#[derive(Clone, Default)]
pub struct PipelineHandlers {
    pub sanitize: Option<StageRef<SanitizeFn>>,
    pub validate: Option<StageRef<ValidateFn>>,
    pub submit: Option<StageRef<SubmitFn>>,
    pub on_success: Option<StageRef<NotifyFn>>,
    pub on_error: Option<StageRef<NotifyFn>>,
}

impl PipelineHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill unset stages with the named references from a form configuration.
    /// Inline handlers already present take precedence.
    pub fn merge_names(mut self, names: &PipelineNames) -> Self {
        fn named<F>(name: &Option<String>) -> Option<StageRef<F>> {
            name.clone().map(StageRef::Named)
        }
        self.sanitize = self.sanitize.or_else(|| named(&names.sanitize));
        self.validate = self.validate.or_else(|| named(&names.validate));
        self.submit = self.submit.or_else(|| named(&names.submit));
        self.on_success = self.on_success.or_else(|| named(&names.on_success));
        self.on_error = self.on_error.or_else(|| named(&names.on_error));
        self
    }

    /// Drop named references, keeping only inline handlers. Used when a
    /// reconfiguration replaces the named pipeline.
    pub fn retain_inline(mut self) -> Self {
        fn inline_only<F>(stage: Option<StageRef<F>>) -> Option<StageRef<F>> {
            stage.filter(|r| matches!(r, StageRef::Inline(_)))
        }
        self.sanitize = inline_only(self.sanitize);
        self.validate = inline_only(self.validate);
        self.submit = inline_only(self.submit);
        self.on_success = inline_only(self.on_success);
        self.on_error = inline_only(self.on_error);
        self
    }

    pub fn sanitize_fn(mut self, f: SanitizeFn) -> Self {
        self.sanitize = Some(StageRef::Inline(f));
        self
    }

    pub fn validate_fn(mut self, f: ValidateFn) -> Self {
        self.validate = Some(StageRef::Inline(f));
        self
    }

    pub fn submit_fn(mut self, f: SubmitFn) -> Self {
        self.submit = Some(StageRef::Inline(f));
        self
    }

    pub fn on_success_fn(mut self, f: NotifyFn) -> Self {
        self.on_success = Some(StageRef::Inline(f));
        self
    }

    pub fn on_error_fn(mut self, f: NotifyFn) -> Self {
        self.on_error = Some(StageRef::Inline(f));
        self
    }

    pub fn resolve_sanitize(&self, registry: &HandlerRegistry) -> Option<SanitizeFn> {
        self.sanitize.as_ref().and_then(|r| r.resolve(&registry.sanitize))
    }

    pub fn resolve_validate(&self, registry: &HandlerRegistry) -> Option<ValidateFn> {
        self.validate.as_ref().and_then(|r| r.resolve(&registry.validate))
    }

    pub fn resolve_submit(&self, registry: &HandlerRegistry) -> Option<SubmitFn> {
        self.submit.as_ref().and_then(|r| r.resolve(&registry.submit))
    }

    pub fn resolve_on_success(&self, registry: &HandlerRegistry) -> Option<NotifyFn> {
        self.on_success.as_ref().and_then(|r| r.resolve(&registry.notify))
    }

    pub fn resolve_on_error(&self, registry: &HandlerRegistry) -> Option<NotifyFn> {
        self.on_error.as_ref().and_then(|r| r.resolve(&registry.notify))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_submit() -> SubmitFn {
        submit_fn(|ctx| async move { Ok(Value::Object(ctx.values)) })
    }

    #[test]
    fn test_inline_resolves_without_registry() {
        let handlers = PipelineHandlers::new().submit_fn(echo_submit());
        let registry = HandlerRegistry::new();
        assert!(handlers.resolve_submit(&registry).is_some());
    }

    #[test]
    fn test_named_resolves_from_registry() {
        let mut registry = HandlerRegistry::new();
        registry.register_submit("app.forms.signup.submit", echo_submit());

        let mut handlers = PipelineHandlers::new();
        handlers.submit = Some(StageRef::Named("app.forms.signup.submit".into()));
        assert!(handlers.resolve_submit(&registry).is_some());
    }

    #[test]
    fn test_unknown_name_resolves_to_none() {
        let mut handlers = PipelineHandlers::new();
        handlers.submit = Some(StageRef::Named("app.forms.missing".into()));
        assert!(handlers.resolve_submit(&HandlerRegistry::new()).is_none());
    }

    #[test]
    fn test_unset_stage_resolves_to_none() {
        let handlers = PipelineHandlers::new();
        let registry = HandlerRegistry::new();
        assert!(handlers.resolve_sanitize(&registry).is_none());
        assert!(handlers.resolve_validate(&registry).is_none());
        assert!(handlers.resolve_submit(&registry).is_none());
    }

    #[test]
    fn test_merge_names_fills_unset_stages() {
        let names = PipelineNames {
            submit: Some("app.submit".into()),
            validate: Some("app.validate".into()),
            ..Default::default()
        };
        let handlers = PipelineHandlers::new().merge_names(&names);
        assert!(matches!(handlers.submit, Some(StageRef::Named(ref n)) if n == "app.submit"));
        assert!(matches!(handlers.validate, Some(StageRef::Named(_))));
        assert!(handlers.sanitize.is_none());
    }

    #[test]
    fn test_merge_names_covers_every_stage() {
        // The five stage fields have four distinct handler shapes; merging
        // must produce a named reference for each of them.
        let names = PipelineNames {
            sanitize: Some("app.sanitize".into()),
            validate: Some("app.validate".into()),
            submit: Some("app.submit".into()),
            on_success: Some("app.ok".into()),
            on_error: Some("app.err".into()),
        };
        let handlers = PipelineHandlers::new().merge_names(&names);
        assert!(matches!(handlers.sanitize, Some(StageRef::Named(ref n)) if n == "app.sanitize"));
        assert!(matches!(handlers.validate, Some(StageRef::Named(ref n)) if n == "app.validate"));
        assert!(matches!(handlers.submit, Some(StageRef::Named(ref n)) if n == "app.submit"));
        assert!(matches!(handlers.on_success, Some(StageRef::Named(ref n)) if n == "app.ok"));
        assert!(matches!(handlers.on_error, Some(StageRef::Named(ref n)) if n == "app.err"));
    }

    #[test]
    fn test_merge_names_keeps_inline_precedence() {
        let names = PipelineNames {
            submit: Some("app.submit".into()),
            ..Default::default()
        };
        let handlers = PipelineHandlers::new()
            .submit_fn(echo_submit())
            .merge_names(&names);
        assert!(matches!(handlers.submit, Some(StageRef::Inline(_))));
    }

    #[test]
    fn test_on_success_and_on_error_share_notify_map() {
        let mut registry = HandlerRegistry::new();
        registry.register_notify("app.notify", notify_fn(|_ctx| async move { Ok(()) }));

        let mut handlers = PipelineHandlers::new();
        handlers.on_success = Some(StageRef::Named("app.notify".into()));
        handlers.on_error = Some(StageRef::Named("app.notify".into()));
        assert!(handlers.resolve_on_success(&registry).is_some());
        assert!(handlers.resolve_on_error(&registry).is_some());
    }

    #[tokio::test]
    async fn test_stage_context_flows_through_handler() {
        let mut values = Map::new();
        values.insert("email".into(), json!("a@b.com"));
        let submit = echo_submit();
        let result = submit(StageContext::new("signup", values)).await.unwrap();
        assert_eq!(result["email"], json!("a@b.com"));
    }

    #[tokio::test]
    async fn test_action_handler_receives_context() {
        let mut registry = HandlerRegistry::new();
        registry.register_action(
            "app.archive",
            action_fn(|ctx| async move {
                anyhow::ensure!(ctx.action_id == "archive", "wrong action id");
                Ok(())
            }),
        );
        let f = registry.action("app.archive").unwrap();
        let ctx = ActionContext {
            action_id: "archive".into(),
            form_id: "f".into(),
            values: Map::new(),
        };
        assert!(f(ctx).await.is_ok());
    }
}
