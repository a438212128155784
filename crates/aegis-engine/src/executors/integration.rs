// integration executor
//
// Dispatches on the configured integration type. `webhook` posts the
// workflow parameters to an external endpoint; `api` and `database` are
// acknowledged without side effects until their backends are wired up. The
// type set is open config data rather than a step kind, so an unknown value
// surfaces as a step error at runtime.

use aegis_core::workflow::StepDefinition;
use serde_json::{json, Value};

use super::{config_str, ExecutorContext};
use crate::outcome::StepOutcome;

pub async fn execute(
    ctx: &ExecutorContext,
    step: &StepDefinition,
    parameters: &Value,
) -> StepOutcome {
    let Some(integration_type) = config_str(&step.config, "type") else {
        return StepOutcome::error("integration requires a type in its config");
    };

    match integration_type {
        "webhook" => webhook(ctx, step, parameters).await,
        "api" => StepOutcome::success(json!({
            "success": true,
            "integration": "api",
            "acknowledged": true,
        })),
        "database" => StepOutcome::success(json!({
            "success": true,
            "integration": "database",
            "acknowledged": true,
        })),
        other => StepOutcome::error(format!("Unknown integration type: {}", other)),
    }
}

async fn webhook(ctx: &ExecutorContext, step: &StepDefinition, parameters: &Value) -> StepOutcome {
    let Some(url) = config_str(&step.config, "url") else {
        return StepOutcome::error("webhook integration requires a url in its config");
    };

    match ctx.http.post(url).json(parameters).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
            StepOutcome::success(json!({
                "success": true,
                "integration": "webhook",
                "status": status,
                "body": body,
            }))
        }
        Err(e) => StepOutcome::error(format!("Webhook integration failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{context_with_model, ScriptedModel};
    use super::*;
    use aegis_core::workflow::StepKind;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn step(config: Value) -> StepDefinition {
        StepDefinition::new("sync", StepKind::Integration, config)
    }

    #[tokio::test]
    async fn webhook_posts_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"threatId": "t1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        let config = json!({"type": "webhook", "url": server.uri()});

        let outcome = execute(&ctx, &step(config), &json!({"threatId": "t1"})).await;
        let StepOutcome::Success(v) = outcome else {
            panic!("expected success");
        };
        assert_eq!(v["status"], 200);
        assert_eq!(v["body"]["ok"], true);
    }

    #[tokio::test]
    async fn webhook_transport_failure_is_an_error() {
        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        let config = json!({"type": "webhook", "url": "http://127.0.0.1:1/down"});

        let outcome = execute(&ctx, &step(config), &json!({})).await;
        match outcome {
            StepOutcome::Error(msg) => assert!(msg.contains("Webhook integration failed")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn api_and_database_are_acknowledged() {
        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        for kind in ["api", "database"] {
            let outcome = execute(&ctx, &step(json!({"type": kind})), &json!({})).await;
            let StepOutcome::Success(v) = outcome else {
                panic!("expected success for {}", kind);
            };
            assert_eq!(v["integration"], kind);
            assert_eq!(v["acknowledged"], true);
        }
    }

    #[tokio::test]
    async fn unknown_type_is_an_error() {
        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        let outcome = execute(&ctx, &step(json!({"type": "carrier-pigeon"})), &json!({})).await;
        match outcome {
            StepOutcome::Error(msg) => assert!(msg.contains("Unknown integration type")),
            other => panic!("expected error, got {:?}", other),
        }
    }
}
