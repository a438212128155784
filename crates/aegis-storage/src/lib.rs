// Key-value storage layer
//
// This crate provides the storage side of the engine's collaborator
// contract:
// - MemoryStore: in-memory KeyValueStore backend (dev mode and tests)
// - WorkflowStore: typed workflow-instance records (`workflow:<id>`)
// - ThreatStore: threat records and correlation (`threat:<id>`)
// - NotificationStore: notification records (`notification:<id>`)

pub mod memory;
pub mod notification_store;
pub mod threat_store;
pub mod workflow_store;

pub use memory::MemoryStore;
pub use notification_store::NotificationStore;
pub use threat_store::ThreatStore;
pub use workflow_store::{WorkflowFilter, WorkflowStore, DEFAULT_LIST_LIMIT};
