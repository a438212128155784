//! Workflow execution engine: step executors and the per-instance
//! orchestration loop.

pub mod engine;
pub mod executors;
pub mod outcome;

pub use engine::{TriggerRequest, WorkflowEngine};
pub use executors::{ExecutorContext, StepExecutors};
pub use outcome::StepOutcome;
