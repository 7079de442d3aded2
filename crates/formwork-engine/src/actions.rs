//! Action binding.
//!
//! The form shell renders a submit control and any number of extra action
//! controls, each locatable by role tag. Because the shell may be fully
//! re-rendered whenever the action configuration changes (replacing control
//! instances), the binder rebuilds its routing and control tables from
//! scratch on every bind; dropping the old tables is the detach.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use formwork_types::config::{ActionsConfig, ExtraActionKind};

/// The engine-side contract of an action control widget. Click delivery
/// happens via the controller's `click(role)` entry point.
pub trait ActionControl: Send + Sync {
    fn set_loading(&self, loading: bool);
    fn set_disabled(&self, disabled: bool);
    fn set_success(&self, success: bool);
}

/// Looks up action controls in the rendered form shell by role tag.
pub trait ActionShell: Send + Sync {
    fn control_for_role(&self, role: &str) -> Option<Arc<dyn ActionControl>>;
}

/// What a click on a bound role does.
#[derive(Clone)]
pub enum ActionRoute {
    /// Run the submission pipeline.
    Submit,
    /// Built-in: reset all fields to their initial values.
    Clear,
    /// Built-in: serialize current values to text.
    CopyValuesAsText,
    /// Host handler, resolved by name from the handler registry.
    Handler(String),
}

/// Role → route and role → control tables for the current shell render.
#[derive(Default)]
pub struct ActionBinder {
    submit_role: String,
    routes: HashMap<String, ActionRoute>,
    controls: HashMap<String, Arc<dyn ActionControl>>,
}

impl ActionBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild bindings from the action configuration and the current shell.
    ///
    /// Previously bound controls are dropped first; a role with no control
    /// in the shell keeps its route (the shell may render it later) but is
    /// logged.
    pub fn bind(&mut self, actions: &ActionsConfig, shell: &dyn ActionShell) {
        self.routes.clear();
        self.controls.clear();

        self.submit_role = actions.submit.role.clone();
        self.insert(&actions.submit.role, ActionRoute::Submit, shell);

        for extra in &actions.extra {
            let route = match &extra.action {
                ExtraActionKind::Clear => ActionRoute::Clear,
                ExtraActionKind::CopyValuesAsText => ActionRoute::CopyValuesAsText,
                ExtraActionKind::Handler { name } => ActionRoute::Handler(name.clone()),
            };
            self.insert(&extra.role, route, shell);
        }

        debug!(roles = self.routes.len(), "Action bindings rebuilt");
    }

    fn insert(&mut self, role: &str, route: ActionRoute, shell: &dyn ActionShell) {
        self.routes.insert(role.to_string(), route);
        match shell.control_for_role(role) {
            Some(control) => {
                self.controls.insert(role.to_string(), control);
            }
            None => warn!(role, "No control found in shell for action role"),
        }
    }

    pub fn route(&self, role: &str) -> Option<&ActionRoute> {
        self.routes.get(role)
    }

    pub fn control(&self, role: &str) -> Option<Arc<dyn ActionControl>> {
        self.controls.get(role).cloned()
    }

    /// The submit control of the current render, if the shell produced one.
    pub fn submit_control(&self) -> Option<Arc<dyn ActionControl>> {
        self.control(&self.submit_role)
    }
}
