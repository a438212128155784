// response_generation executor
//
// Asks the model for a response plan and extracts the recommended actions
// from lines that name one ("Action:" / "Step:").

use aegis_core::traits::ChatMessage;
use aegis_core::workflow::StepDefinition;
use serde_json::{json, Value};

use super::{config_str, ExecutorContext};
use crate::outcome::StepOutcome;

const SYSTEM_PROMPT: &str = "You are a security incident responder. \
    Produce a concrete, prioritized response plan. List each recommended \
    action on its own line prefixed with 'Action:'.";

const DEFAULT_PROMPT: &str = "Generate a response plan for the following security context.";

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
        Ok(text) => {
            let actions = extract_actions(&text);
            StepOutcome::success(json!({
                "success": true,
                "plan": text,
                "actions": actions,
            }))
        }
        Err(e) => StepOutcome::error(format!("Response generation failed: {}", e)),
    }
}

/// Pull action items out of the plan text, one per "Action:"/"Step:" line.
fn extract_actions(plan: &str) -> Vec<String> {
    plan.lines()
        .filter_map(|line| {
            let line = line.trim().trim_start_matches(['-', '*', ' ']);
            let rest = line
                .strip_prefix("Action:")
                .or_else(|| line.strip_prefix("Step:"))?;
            let rest = rest.trim();
            (!rest.is_empty()).then(|| rest.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::testing::{context_with_model, FailingModel, ScriptedModel};
    use super::*;
    use aegis_core::workflow::StepKind;
    use std::sync::Arc;

    #[tokio::test]
    async fn extracts_actions_from_plan_lines() {
        let plan = "Containment plan:\n\
            Action: Isolate the affected host\n\
            Some narrative text.\n\
            - Step: Rotate credentials\n\
            Action:\n";
        let ctx = context_with_model(Arc::new(ScriptedModel(plan.to_string())));
        let step = StepDefinition::new("respond", StepKind::ResponseGeneration, json!({}));

        let outcome = execute(&ctx, &step, &json!({"threatId": "t1"})).await;
        let StepOutcome::Success(v) = outcome else {
            panic!("expected success");
        };
        assert_eq!(v["actions"][0], "Isolate the affected host");
        assert_eq!(v["actions"][1], "Rotate credentials");
        assert_eq!(v["actions"].as_array().unwrap().len(), 2);
        assert_eq!(v["plan"], plan);
    }

    #[tokio::test]
    async fn plan_without_actions_yields_empty_list() {
        let ctx = context_with_model(Arc::new(ScriptedModel("nothing to do".to_string())));
        let step = StepDefinition::new("respond", StepKind::ResponseGeneration, json!({}));

        let outcome = execute(&ctx, &step, &json!({})).await;
        let StepOutcome::Success(v) = outcome else {
            panic!("expected success");
        };
        assert!(v["actions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn model_failure_becomes_step_error() {
        let ctx = context_with_model(Arc::new(FailingModel));
        let step = StepDefinition::new("respond", StepKind::ResponseGeneration, json!({}));

        let outcome = execute(&ctx, &step, &json!({})).await;
        match outcome {
            StepOutcome::Error(msg) => assert!(msg.contains("Response generation failed")),
            other => panic!("expected error, got {:?}", other),
        }
    }
}
