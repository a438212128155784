// notification executor
//
// Persists a notification record and optionally delivers it to a configured
// webhook. The record is written before any delivery attempt; a failed
// delivery is reported in the result, not treated as a step failure.

use aegis_core::workflow::StepDefinition;
use serde_json::{json, Value};
use tracing::warn;

use super::{config_str, ExecutorContext};
use crate::outcome::StepOutcome;

pub async fn execute(
    ctx: &ExecutorContext,
    step: &StepDefinition,
    parameters: &Value,
) -> StepOutcome {
    let title = config_str(&step.config, "title").unwrap_or("Workflow notification");
    let severity = config_str(&step.config, "severity").unwrap_or("info");
    let body = json!({
        "step": step.name,
        "parameters": parameters,
    });

    let notification_id = match ctx.notifications.create(title, severity, body.clone()).await {
        Ok(id) => id,
        Err(e) => return StepOutcome::error(format!("Failed to store notification: {}", e)),
    };

    let mut delivered = None;
    if let Some(webhook_url) = config_str(&step.config, "webhookUrl") {
        let payload = json!({
            "id": notification_id,
            "title": title,
            "severity": severity,
            "body": body,
        });
        match ctx.http.post(webhook_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                delivered = Some(true);
            }
            Ok(response) => {
                warn!(
                    notification_id = %notification_id,
                    status = %response.status(),
                    "Webhook delivery rejected"
                );
                delivered = Some(false);
            }
            Err(e) => {
                warn!(notification_id = %notification_id, error = %e, "Webhook delivery failed");
                delivered = Some(false);
            }
        }
    }

    let mut result = json!({
        "success": true,
        "notificationId": notification_id,
    });
    if let Some(delivered) = delivered {
        result["delivered"] = delivered.into();
    }
    StepOutcome::success(result)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{context_with_model, ScriptedModel};
    use super::*;
    use aegis_core::workflow::StepKind;
    use std::sync::Arc;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn persists_notification_record() {
        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        let step = StepDefinition::new(
            "alert",
            StepKind::Notification,
            json!({"title": "Incident", "severity": "high"}),
        );

        let outcome = execute(&ctx, &step, &json!({"incidentId": "i1"})).await;
        let StepOutcome::Success(v) = outcome else {
            panic!("expected success");
        };
        assert_eq!(v["success"], true);
        // Not configured for delivery, so no delivered field
        assert!(v.get("delivered").is_none());

        let id: Uuid = serde_json::from_value(v["notificationId"].clone()).unwrap();
        let record = ctx.notifications.get(id).await.unwrap().unwrap();
        assert_eq!(record["title"], "Incident");
        assert_eq!(record["severity"], "high");
    }

    #[tokio::test]
    async fn delivers_to_configured_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"title": "Incident"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        let step = StepDefinition::new(
            "alert",
            StepKind::Notification,
            json!({"title": "Incident", "webhookUrl": server.uri()}),
        );

        let outcome = execute(&ctx, &step, &json!({})).await;
        let StepOutcome::Success(v) = outcome else {
            panic!("expected success");
        };
        assert_eq!(v["delivered"], true);
    }

    #[tokio::test]
    async fn failed_delivery_still_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        let step = StepDefinition::new(
            "alert",
            StepKind::Notification,
            json!({"webhookUrl": server.uri()}),
        );

        let outcome = execute(&ctx, &step, &json!({})).await;
        let StepOutcome::Success(v) = outcome else {
            panic!("expected success");
        };
        assert_eq!(v["delivered"], false);
        // The record exists even though delivery failed
        assert_eq!(ctx.notifications.list().await.unwrap().len(), 1);
    }
}
