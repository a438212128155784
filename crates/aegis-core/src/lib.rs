// Aegis core domain
//
// This crate holds everything the workflow engine needs that is independent
// of any concrete backend:
// - The workflow data model (definitions, instances, step/error records)
// - The definition registry (workflow-type -> ordered steps)
// - Collaborator traits (KeyValueStore, LanguageModel) for pluggable backends
// - The Workers-AI-style LLM client
//
// Key design decisions:
// - Step kinds are a closed enum; executor dispatch is exhaustive
// - Instances snapshot their definition's steps at trigger time
// - Step-level failures are data on the instance, never EngineError values

pub mod error;
pub mod llm;
pub mod registry;
pub mod traits;
pub mod workflow;

// Re-exports for convenience
pub use error::{EngineError, Result};
pub use llm::AiClient;
pub use registry::DefinitionRegistry;
pub use traits::{ChatMessage, KeyValueStore, LanguageModel, MessageRole};
pub use workflow::{
    ErrorRecord, StepDefinition, StepKind, StepRecord, WorkflowDefinition, WorkflowInstance,
    WorkflowStatus,
};
