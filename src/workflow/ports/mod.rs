//! Port contracts for workflow phase enforcement.
//!
//! Ports define infrastructure-agnostic interfaces used by the enforcer.

pub mod evidence;
pub mod store;

pub use evidence::{EvidenceError, EvidenceProvider, EvidenceResult};
pub use store::{WorkflowStateStore, WorkflowStoreError, WorkflowStoreResult};
