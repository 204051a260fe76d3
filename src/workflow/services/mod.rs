//! Application services for workflow phase enforcement.

mod enforcer;

pub use enforcer::{WorkflowEnforcer, WorkflowEnforcerError, WorkflowEnforcerResult};
