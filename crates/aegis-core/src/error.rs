// Error types for the workflow engine

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur around workflow execution.
///
/// Step-level failures are deliberately NOT represented here: a failing step
/// is recorded as data on the workflow instance and never surfaces as an
/// `EngineError`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No workflow definition registered for the requested type
    #[error("Unknown workflow type: {0}")]
    DefinitionNotFound(String),

    /// No workflow instance stored under the given id
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(Uuid),

    /// Operation not permitted in the instance's current status
    #[error("{0}")]
    Conflict(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        EngineError::Storage(msg.into())
    }

    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        EngineError::Llm(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        EngineError::Conflict(msg.into())
    }
}
