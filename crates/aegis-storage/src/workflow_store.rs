// Typed workflow-instance layer over the key-value contract
//
// One record per instance under `workflow:<id>`. The engine's execution loop
// is the only writer of a running instance's steps/results; everything else
// here is read-or-conditional-write against the same record.

use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use aegis_core::error::{EngineError, Result};
use aegis_core::traits::KeyValueStore;
use aegis_core::workflow::{WorkflowInstance, WorkflowStatus};

const KEY_PREFIX: &str = "workflow:";

/// Default number of instances returned by a list query
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Filter for listing workflow instances
#[derive(Debug, Clone, Default)]
pub struct WorkflowFilter {
    pub status: Option<WorkflowStatus>,
    pub workflow_type: Option<String>,
    pub limit: Option<usize>,
}

/// Workflow-instance persistence over a KeyValueStore
#[derive(Clone)]
pub struct WorkflowStore {
    kv: Arc<dyn KeyValueStore>,
}

impl WorkflowStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn key(id: Uuid) -> String {
        format!("{}{}", KEY_PREFIX, id)
    }

    /// Persist the full instance document (last write wins)
    pub async fn save(&self, instance: &WorkflowInstance) -> Result<()> {
        let doc = serde_json::to_value(instance)
            .map_err(|e| EngineError::storage(format!("serialize workflow: {}", e)))?;
        self.kv.put(&Self::key(instance.id), doc).await
    }

    /// Load one instance by id
    pub async fn get(&self, id: Uuid) -> Result<Option<WorkflowInstance>> {
        match self.kv.get(&Self::key(id)).await? {
            Some(doc) => {
                let instance = serde_json::from_value(doc)
                    .map_err(|e| EngineError::storage(format!("corrupt workflow record: {}", e)))?;
                Ok(Some(instance))
            }
            None => Ok(None),
        }
    }

    /// List instances matching the filter, newest `created_at` first,
    /// truncated at the filter's limit (default 50).
    pub async fn list(&self, filter: &WorkflowFilter) -> Result<Vec<WorkflowInstance>> {
        let records = self.kv.list(Some(KEY_PREFIX)).await?;

        let mut instances: Vec<WorkflowInstance> = records
            .into_iter()
            .filter_map(|(key, doc)| match serde_json::from_value(doc) {
                Ok(instance) => Some(instance),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping unreadable workflow record");
                    None
                }
            })
            .filter(|w: &WorkflowInstance| {
                filter.status.map_or(true, |s| w.status == s)
                    && filter
                        .workflow_type
                        .as_deref()
                        .map_or(true, |t| w.workflow_type == t)
            })
            .collect();

        instances.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        instances.truncate(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));
        Ok(instances)
    }

    /// Raw status of the stored record, used by the execution loop's
    /// cooperative cancellation check without deserializing the whole
    /// document.
    pub async fn status_of(&self, id: Uuid) -> Result<Option<WorkflowStatus>> {
        let Some(doc) = self.kv.get(&Self::key(id)).await? else {
            return Ok(None);
        };
        let status = doc
            .get("status")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());
        Ok(status)
    }
}
