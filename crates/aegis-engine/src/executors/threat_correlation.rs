// threat_correlation executor
//
// Correlates the workflow's threat against the threat store and returns the
// correlated set with its count. With `stopIfUnmatched` set, an empty
// correlation ends the workflow early (nothing left to chase).

use aegis_core::workflow::StepDefinition;
use serde_json::{json, Value};

use super::{config_str, ExecutorContext};
use crate::outcome::StepOutcome;

pub async fn execute(
    ctx: &ExecutorContext,
    step: &StepDefinition,
    parameters: &Value,
) -> StepOutcome {
    let Some(threat_id) = parameters
        .get("threatId")
        .and_then(Value::as_str)
        .or_else(|| config_str(&step.config, "threatId"))
    else {
        return StepOutcome::error("threat_correlation requires a threatId parameter");
    };

    let correlation_type = config_str(&step.config, "correlationType").unwrap_or("similar");

    match ctx.threats.correlate(threat_id, correlation_type).await {
        Ok(Some(correlated)) => {
            let count = correlated.len();
            let result = json!({
                "success": true,
                "correlationType": correlation_type,
                "correlatedThreats": correlated,
                "count": count,
            });
            let stop_if_unmatched = step
                .config
                .get("stopIfUnmatched")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if count == 0 && stop_if_unmatched {
                StepOutcome::stop(result)
            } else {
                StepOutcome::success(result)
            }
        }
        Ok(None) => StepOutcome::error(format!("Threat not found: {}", threat_id)),
        Err(e) => StepOutcome::error(format!("Threat correlation failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{context_with_model, ScriptedModel};
    use super::*;
    use aegis_core::workflow::StepKind;
    use std::sync::Arc;

    fn step(config: Value) -> StepDefinition {
        StepDefinition::new("correlate", StepKind::ThreatCorrelation, config)
    }

    #[tokio::test]
    async fn correlates_against_stored_threats() {
        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        ctx.threats
            .put_threat("t1", json!({"ip": "10.0.0.1", "type": "malware"}))
            .await
            .unwrap();
        ctx.threats
            .put_threat("t2", json!({"ip": "10.0.0.1", "type": "malware"}))
            .await
            .unwrap();

        let outcome = execute(&ctx, &step(json!({})), &json!({"threatId": "t1"})).await;
        match outcome {
            StepOutcome::Success(v) => {
                assert_eq!(v["count"], 1);
                assert_eq!(v["correlationType"], "similar");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_threat_id_is_an_error() {
        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        let outcome = execute(&ctx, &step(json!({})), &json!({})).await;
        assert!(outcome.is_error());
    }

    #[tokio::test]
    async fn unknown_target_threat_is_an_error() {
        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        let outcome = execute(&ctx, &step(json!({})), &json!({"threatId": "ghost"})).await;
        match outcome {
            StepOutcome::Error(msg) => assert!(msg.contains("Threat not found")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_correlation_with_stop_flag_stops_early() {
        let ctx = context_with_model(Arc::new(ScriptedModel(String::new())));
        ctx.threats
            .put_threat("lonely", json!({"type": "phishing"}))
            .await
            .unwrap();

        let outcome = execute(
            &ctx,
            &step(json!({"stopIfUnmatched": true})),
            &json!({"threatId": "lonely"}),
        )
        .await;
        match outcome {
            StepOutcome::Stop(v) => assert_eq!(v["count"], 0),
            other => panic!("expected stop, got {:?}", other),
        }
    }
}
