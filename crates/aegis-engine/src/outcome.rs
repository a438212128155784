// Step outcome contract
//
// Every executor resolves to exactly one of these; faults inside an executor
// are converted to `Error` there, never propagated, so the step loop can
// treat all outcomes uniformly.

use serde_json::Value;

/// Result of executing one workflow step.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// Step succeeded; the workflow proceeds to the next step
    Success(Value),
    /// Step succeeded and decided the workflow is done; remaining steps are
    /// skipped and the workflow completes
    Stop(Value),
    /// Step failed; the workflow stops and is marked failed
    Error(String),
}

impl StepOutcome {
    pub fn success(value: Value) -> Self {
        StepOutcome::Success(value)
    }

    pub fn stop(value: Value) -> Self {
        StepOutcome::Stop(value)
    }

    pub fn error(message: impl Into<String>) -> Self {
        StepOutcome::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StepOutcome::Error(_))
    }
}
