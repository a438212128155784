// Step executors
//
// One module per step kind. Dispatch is an exhaustive match on StepKind, so
// adding a kind without an executor is a compile error. Each executor owns
// its error handling: whatever goes wrong inside becomes
// `StepOutcome::Error`, and the step loop never sees a fault.
//
// Each executor is invoked with `(step, workflow parameters)`; the step's
// `config` is an opaque mapping only its executor interprets.

use std::sync::Arc;

use aegis_core::traits::LanguageModel;
use aegis_core::workflow::{StepDefinition, StepKind};
use aegis_storage::{NotificationStore, ThreatStore};
use serde_json::Value;

use crate::outcome::StepOutcome;

mod ai_analysis;
mod data_collection;
mod integration;
mod notification;
mod response_generation;
mod threat_correlation;

/// Shared collaborators available to every executor
pub struct ExecutorContext {
    pub llm: Arc<dyn LanguageModel>,
    pub threats: ThreatStore,
    pub notifications: NotificationStore,
    pub http: reqwest::Client,
}

/// Executor dispatch over the closed set of step kinds
pub struct StepExecutors {
    ctx: ExecutorContext,
}

impl StepExecutors {
    pub fn new(ctx: ExecutorContext) -> Self {
        Self { ctx }
    }

    /// Execute one step against the workflow's parameters.
    ///
    /// Never fails: executor-level problems come back as
    /// `StepOutcome::Error`.
    pub async fn execute(&self, step: &StepDefinition, parameters: &Value) -> StepOutcome {
        match step.kind {
            StepKind::AiAnalysis => ai_analysis::execute(&self.ctx, step, parameters).await,
            StepKind::ThreatCorrelation => {
                threat_correlation::execute(&self.ctx, step, parameters).await
            }
            StepKind::Notification => notification::execute(&self.ctx, step, parameters).await,
            StepKind::DataCollection => {
                data_collection::execute(&self.ctx, step, parameters).await
            }
            StepKind::ResponseGeneration => {
                response_generation::execute(&self.ctx, step, parameters).await
            }
            StepKind::Integration => integration::execute(&self.ctx, step, parameters).await,
        }
    }
}

/// Read an optional string field from a step config
fn config_str<'a>(config: &'a Value, field: &str) -> Option<&'a str> {
    config.get(field).and_then(Value::as_str)
}
