// Workflow engine
//
// Triggering resolves the workflow type against the registry, persists a
// fresh instance, and spawns one detached tokio task that runs the step
// loop. The loop threads a locally-owned instance value through the steps
// and persists after every step; the stored record is the source of truth
// for status, which is how cancellation reaches a running loop.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use aegis_core::error::{EngineError, Result};
use aegis_core::registry::DefinitionRegistry;
use aegis_core::workflow::{WorkflowInstance, WorkflowStatus};
use aegis_storage::{WorkflowFilter, WorkflowStore};

use crate::executors::StepExecutors;
use crate::outcome::StepOutcome;

const CANCEL_REASON: &str = "Workflow cancelled by user";

/// Request to start a new workflow instance
#[derive(Debug, Clone)]
pub struct TriggerRequest {
    pub workflow_type: String,
    pub parameters: Value,
    pub priority: Option<String>,
}

/// Orchestrates workflow instances over the store and the step executors.
///
/// Cheap to clone; all clones share the same active-task map.
#[derive(Clone)]
pub struct WorkflowEngine {
    registry: Arc<DefinitionRegistry>,
    workflows: WorkflowStore,
    executors: Arc<StepExecutors>,
    /// Active instances (workflow id -> task handle)
    active: Arc<RwLock<HashMap<Uuid, JoinHandle<()>>>>,
}

impl WorkflowEngine {
    pub fn new(
        registry: DefinitionRegistry,
        workflows: WorkflowStore,
        executors: StepExecutors,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            workflows,
            executors: Arc::new(executors),
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    /// Start a new instance of a registered workflow type.
    ///
    /// Returns as soon as the instance is persisted and its execution task
    /// is spawned; the returned snapshot is the instance at trigger time.
    pub async fn trigger(&self, request: TriggerRequest) -> Result<WorkflowInstance> {
        let definition = self
            .registry
            .resolve(&request.workflow_type)
            .ok_or_else(|| EngineError::DefinitionNotFound(request.workflow_type.clone()))?;

        let instance = WorkflowInstance::new(
            &request.workflow_type,
            definition,
            request.parameters,
            request.priority,
        );
        self.workflows.save(&instance).await?;

        info!(
            workflow_id = %instance.id,
            workflow_type = %instance.workflow_type,
            steps = instance.steps.len(),
            "Starting workflow execution"
        );

        let workflows = self.workflows.clone();
        let executors = self.executors.clone();
        let active = self.active.clone();
        let id = instance.id;
        let running = instance.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = run_steps(&workflows, &executors, running).await {
                warn!(workflow_id = %id, error = %e, "Workflow orchestration failed");
                mark_failed(&workflows, id, &e).await;
            }
            active.write().await.remove(&id);
        });
        self.active.write().await.insert(id, handle);

        Ok(instance)
    }

    /// Load one instance by id
    pub async fn get(&self, id: Uuid) -> Result<WorkflowInstance> {
        self.workflows
            .get(id)
            .await?
            .ok_or(EngineError::WorkflowNotFound(id))
    }

    /// List instances matching the filter, newest first
    pub async fn list(&self, filter: &WorkflowFilter) -> Result<Vec<WorkflowInstance>> {
        self.workflows.list(filter).await
    }

    /// Cancel a running instance.
    ///
    /// Writes the terminal status on the stored record; the execution task
    /// picks it up at its next cancel check. A step already in flight may
    /// still append its result, but the cancelled status is preserved.
    pub async fn cancel(&self, id: Uuid) -> Result<WorkflowInstance> {
        let Some(mut instance) = self.workflows.get(id).await? else {
            return Err(EngineError::WorkflowNotFound(id));
        };
        if instance.status.is_terminal() {
            return Err(EngineError::conflict(format!(
                "Workflow is already {}",
                instance.status
            )));
        }

        // The reason lives in metadata: the errors list stays reserved for
        // failed runs.
        if let Some(meta) = instance.metadata.as_object_mut() {
            meta.insert(
                "cancellationReason".to_string(),
                Value::String(CANCEL_REASON.to_string()),
            );
        }
        instance.finish(WorkflowStatus::Cancelled);
        self.workflows.save(&instance).await?;

        info!(workflow_id = %id, "Workflow cancelled");
        Ok(instance)
    }

    /// Number of instances with a live execution task
    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    /// Wait for an instance's execution task to finish.
    /// A no-op if the task already completed.
    pub async fn wait_for(&self, id: Uuid) {
        let handle = self.active.write().await.remove(&id);
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Abort all outstanding execution tasks
    pub async fn shutdown(&self) {
        info!("Shutting down workflow engine");
        let mut active = self.active.write().await;
        for (id, handle) in active.drain() {
            info!(workflow_id = %id, "Aborting workflow on shutdown");
            handle.abort();
        }
    }
}

/// The step loop for one instance.
///
/// Progress is persisted after every step. Before each dispatch the stored
/// status is re-read so a cancel written by the API is honored at the next
/// step boundary.
async fn run_steps(
    workflows: &WorkflowStore,
    executors: &StepExecutors,
    mut instance: WorkflowInstance,
) -> Result<()> {
    while instance.current_step < instance.steps.len() {
        if workflows.status_of(instance.id).await? == Some(WorkflowStatus::Cancelled) {
            info!(workflow_id = %instance.id, "Workflow cancelled, aborting step loop");
            // A stale cancel write may have clobbered results persisted
            // since it loaded the record; restore them before leaving.
            persist_step(workflows, &instance).await?;
            return Ok(());
        }

        let index = instance.current_step;
        let step = instance.steps[index].clone();
        debug!(
            workflow_id = %instance.id,
            step = %step.name,
            index,
            "Executing workflow step"
        );

        match executors.execute(&step, &instance.parameters).await {
            StepOutcome::Success(result) => {
                instance.record_result(index, &step.name, result);
                instance.current_step = index + 1;
            }
            StepOutcome::Stop(result) => {
                info!(workflow_id = %instance.id, step = %step.name, "Step requested early completion");
                instance.record_result(index, &step.name, result);
                instance.current_step = index + 1;
                instance.finish(WorkflowStatus::Completed);
            }
            StepOutcome::Error(message) => {
                warn!(workflow_id = %instance.id, step = %step.name, error = %message, "Workflow step failed");
                instance.record_result(index, &step.name, serde_json::json!({ "error": message }));
                instance.record_error(&step.name, message);
                instance.finish(WorkflowStatus::Failed);
            }
        }

        persist_step(workflows, &instance).await?;
        if instance.status.is_terminal() {
            return Ok(());
        }
    }

    instance.finish(WorkflowStatus::Completed);
    persist_step(workflows, &instance).await?;
    info!(
        workflow_id = %instance.id,
        steps = instance.results.len(),
        "Workflow completed"
    );
    Ok(())
}

/// Persist the loop's instance, deferring to a concurrent cancel.
///
/// If a cancel landed on the stored record, the stored cancelled record
/// wins; any step results it is missing (finished while the cancel was in
/// flight, or clobbered by a stale cancel write) are appended to it so no
/// completed work is lost.
async fn persist_step(workflows: &WorkflowStore, instance: &WorkflowInstance) -> Result<()> {
    if let Some(mut stored) = workflows.get(instance.id).await? {
        if stored.status == WorkflowStatus::Cancelled {
            if stored.results.len() < instance.results.len() {
                stored
                    .results
                    .extend_from_slice(&instance.results[stored.results.len()..]);
                stored.current_step = instance.current_step;
                workflows.save(&stored).await?;
            }
            return Ok(());
        }
    }
    workflows.save(instance).await
}

/// Record an orchestration-level failure on the stored instance
async fn mark_failed(workflows: &WorkflowStore, id: Uuid, cause: &EngineError) {
    match workflows.get(id).await {
        Ok(Some(mut instance)) if !instance.status.is_terminal() => {
            instance.record_error("workflow_execution", cause.to_string());
            instance.finish(WorkflowStatus::Failed);
            if let Err(e) = workflows.save(&instance).await {
                error!(workflow_id = %id, error = %e, "Failed to persist workflow failure");
            }
        }
        Ok(_) => {}
        Err(e) => {
            error!(workflow_id = %id, error = %e, "Failed to load workflow for failure handling");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::workflow::{StepDefinition, StepKind, WorkflowDefinition};
    use aegis_storage::MemoryStore;
    use serde_json::json;

    fn two_step_instance() -> WorkflowInstance {
        let def = WorkflowDefinition {
            name: "Test".to_string(),
            steps: vec![
                StepDefinition::new("one", StepKind::AiAnalysis, json!({})),
                StepDefinition::new("two", StepKind::AiAnalysis, json!({})),
            ],
        };
        WorkflowInstance::new("test", &def, json!({}), None)
    }

    #[tokio::test]
    async fn persist_keeps_results_dropped_by_a_stale_cancel_write() {
        let workflows = WorkflowStore::new(std::sync::Arc::new(MemoryStore::new()));
        let mut local = two_step_instance();

        // A cancel built from a snapshot without the first step's result
        // lands on the store after that step finished.
        let mut cancelled = local.clone();
        cancelled.finish(WorkflowStatus::Cancelled);
        workflows.save(&cancelled).await.unwrap();

        local.record_result(0, "one", json!({"success": true}));
        local.current_step = 1;
        persist_step(&workflows, &local).await.unwrap();

        let stored = workflows.get(local.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WorkflowStatus::Cancelled);
        assert_eq!(stored.completed_at, cancelled.completed_at);
        assert_eq!(stored.results.len(), 1);
        assert_eq!(stored.results[0].step_name, "one");
        assert_eq!(stored.current_step, 1);
    }

    #[tokio::test]
    async fn persist_leaves_matching_cancelled_record_alone() {
        let workflows = WorkflowStore::new(std::sync::Arc::new(MemoryStore::new()));
        let local = two_step_instance();

        let mut cancelled = local.clone();
        cancelled.finish(WorkflowStatus::Cancelled);
        workflows.save(&cancelled).await.unwrap();

        // Nothing new on the loop's side: the cancelled record stays as is
        persist_step(&workflows, &local).await.unwrap();

        let stored = workflows.get(local.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WorkflowStatus::Cancelled);
        assert!(stored.results.is_empty());
    }
}
