// Workflow data model
//
// A WorkflowDefinition is the static, registry-held list of steps for a
// workflow type. A WorkflowInstance is one runtime execution record: it
// snapshots the definition's steps at trigger time so later registry changes
// never affect in-flight work.
//
// Records are serialized camelCase to stay compatible with the stored
// document shape (`createdAt`, `currentStep`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle status of a workflow instance.
///
/// Transitions are forward-only: once a terminal status is reached the
/// instance is never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    /// Terminal statuses permit no further mutation
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "running" => Ok(WorkflowStatus::Running),
            "completed" => Ok(WorkflowStatus::Completed),
            "failed" => Ok(WorkflowStatus::Failed),
            "cancelled" => Ok(WorkflowStatus::Cancelled),
            other => Err(format!("unknown workflow status: {}", other)),
        }
    }
}

/// The kind of a step, selecting its executor.
///
/// This is a closed set: executor dispatch matches exhaustively on it, so an
/// unhandled kind is a compile error rather than a runtime fallback string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    AiAnalysis,
    ThreatCorrelation,
    Notification,
    DataCollection,
    ResponseGeneration,
    Integration,
}

/// One step of a workflow definition.
///
/// `config` is an opaque mapping consumed only by the executor for `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StepDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
    #[serde(default)]
    pub config: Value,
}

impl StepDefinition {
    pub fn new(name: impl Into<String>, kind: StepKind, config: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            config,
        }
    }
}

/// Static ordered list of steps associated with a workflow type.
/// Immutable after registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkflowDefinition {
    pub name: String,
    pub steps: Vec<StepDefinition>,
}

/// Result of one attempted step, appended in step order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step_index: usize,
    pub step_name: String,
    pub result: Value,
    pub timestamp: DateTime<Utc>,
}

/// One recorded failure, either from a step or from the orchestration
/// itself (`step = "workflow_execution"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorRecord {
    pub step: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// One runtime execution record of a workflow type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub workflow_type: String,
    pub status: WorkflowStatus,
    pub priority: String,
    pub created_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub parameters: Value,
    /// Snapshot of the resolved definition's steps at trigger time
    pub steps: Vec<StepDefinition>,
    pub current_step: usize,
    pub results: Vec<StepRecord>,
    pub errors: Vec<ErrorRecord>,
    pub metadata: Value,
}

impl WorkflowInstance {
    /// Build a fresh instance from a resolved definition.
    ///
    /// UUID v7 ids are time-ordered (timestamp plus random suffix), so
    /// uniqueness is best-effort and ids sort roughly by creation time.
    pub fn new(
        workflow_type: impl Into<String>,
        definition: &WorkflowDefinition,
        parameters: Value,
        priority: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let triggered_by = parameters
            .get("userId")
            .and_then(|v| v.as_str())
            .unwrap_or("system")
            .to_string();

        Self {
            id: Uuid::now_v7(),
            workflow_type: workflow_type.into(),
            status: WorkflowStatus::Running,
            priority: priority.unwrap_or_else(|| "normal".to_string()),
            created_at: now,
            started_at: now,
            completed_at: None,
            parameters,
            steps: definition.steps.clone(),
            current_step: 0,
            results: Vec::new(),
            errors: Vec::new(),
            metadata: serde_json::json!({ "triggeredBy": triggered_by }),
        }
    }

    /// Append the result of the step at `step_index`
    pub fn record_result(&mut self, step_index: usize, step_name: &str, result: Value) {
        self.results.push(StepRecord {
            step_index,
            step_name: step_name.to_string(),
            result,
            timestamp: Utc::now(),
        });
    }

    /// Append a failure entry
    pub fn record_error(&mut self, step: &str, error: impl Into<String>) {
        self.errors.push(ErrorRecord {
            step: step.to_string(),
            error: error.into(),
            timestamp: Utc::now(),
        });
    }

    /// Transition to a terminal status, setting `completed_at`.
    /// A no-op if the instance is already terminal.
    pub fn finish(&mut self, status: WorkflowStatus) {
        debug_assert!(status.is_terminal());
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.completed_at = Some(Utc::now());
    }
}
