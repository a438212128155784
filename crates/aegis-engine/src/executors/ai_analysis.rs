// ai_analysis executor
//
// Builds a system/user prompt pair from the step's configured prompt and the
// workflow's parameters, and returns the model's text as `analysis`.

use aegis_core::traits::ChatMessage;
use aegis_core::workflow::StepDefinition;
use serde_json::{json, Value};

use super::{config_str, ExecutorContext};
use crate::outcome::StepOutcome;

const SYSTEM_PROMPT: &str = "You are a cybersecurity analyst assistant. \
    Provide accurate, actionable threat intelligence analysis. \
    Be concise and focus on facts.";

const DEFAULT_PROMPT: &str = "Analyze the following security context.";

pub async fn execute(
    ctx: &ExecutorContext,
    step: &StepDefinition,
    parameters: &Value,
) -> StepOutcome {
    let prompt = config_str(&step.config, "prompt").unwrap_or(DEFAULT_PROMPT);
    let serialized = serde_json::to_string_pretty(parameters).unwrap_or_default();
    let user = format!("{}\n\nWorkflow parameters:\n{}", prompt, serialized);

    match ctx
        .llm
        .generate(vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)])
        .await
    {
        Ok(text) => StepOutcome::success(json!({
            "success": true,
            "analysis": text,
        })),
        Err(e) => StepOutcome::error(format!("AI analysis failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{context_with_model, FailingModel, ScriptedModel};
    use super::*;
    use aegis_core::workflow::StepKind;
    use std::sync::Arc;

    #[tokio::test]
    async fn returns_model_text_as_analysis() {
        let ctx = context_with_model(Arc::new(ScriptedModel("looks bad".to_string())));
        let step = StepDefinition::new(
            "analyze",
            StepKind::AiAnalysis,
            json!({"prompt": "Assess this."}),
        );

        let outcome = execute(&ctx, &step, &json!({"threatId": "t1"})).await;
        match outcome {
            StepOutcome::Success(v) => {
                assert_eq!(v["success"], true);
                assert_eq!(v["analysis"], "looks bad");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn model_failure_becomes_step_error() {
        let ctx = context_with_model(Arc::new(FailingModel));
        let step = StepDefinition::new("analyze", StepKind::AiAnalysis, json!({}));

        let outcome = execute(&ctx, &step, &json!({})).await;
        match outcome {
            StepOutcome::Error(msg) => assert!(msg.contains("AI analysis failed")),
            other => panic!("expected error, got {:?}", other),
        }
    }
}
