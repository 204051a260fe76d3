//! In-memory adapters for workflow ports.

mod evidence;
mod store;

pub use evidence::StaticEvidence;
pub use store::InMemoryWorkflowStateStore;
