//! Filesystem adapters for workflow ports.

mod store;

pub use store::FileWorkflowStateStore;
