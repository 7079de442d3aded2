//! Minimal end-to-end form run: two fields, a sanitize stage, and a stubbed
//! submit handler, with outbound events printed as they arrive.
//!
//! ```sh
//! cargo run -p formwork-engine --example signup
//! ```

use formwork_engine::handler::{sanitize_fn, submit_fn, HandlerRegistry, PipelineHandlers};
use formwork_engine::orchestrator::FormController;
use formwork_types::notification::{FieldNotification, NotificationKind};
use formwork_types::FormConfig;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let handlers = PipelineHandlers::new()
        .sanitize_fn(sanitize_fn(|ctx| async move {
            let mut values = ctx.values;
            if let Some(serde_json::Value::String(s)) = values.get("email").cloned() {
                values.insert("email".into(), json!(s.trim().to_lowercase()));
            }
            Ok(Some(values))
        }))
        .submit_fn(submit_fn(|ctx| async move {
            tracing::info!(form_id = %ctx.form_id, "submitting to backend");
            Ok(json!({ "success": true, "user": { "id": 1 } }))
        }));

    let controller = FormController::new(
        FormConfig::new("signup"),
        handlers,
        HandlerRegistry::new(),
    )?;
    let mut events = controller.take_events().ok_or_else(|| {
        anyhow::anyhow!("event receiver already taken")
    })?;

    controller.notify(
        FieldNotification::new(NotificationKind::Change, "email")
            .with_value(json!("  Jane@Example.com "))
            .with_required(true),
    );
    controller.notify(
        FieldNotification::new(NotificationKind::Change, "newsletter").with_value(json!(true)),
    );

    let outcome = controller.submit().await;
    tracing::info!(?outcome, "submission finished");

    while let Ok(envelope) = events.try_recv() {
        println!("{}", serde_json::to_string(&envelope)?);
    }
    Ok(())
}
