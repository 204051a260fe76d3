//! Domain model for workflow phase enforcement.
//!
//! Everything in here is pure: the phase rules describe what must hold, and
//! the evidence they need from the outside world is expressed as
//! [`EvidenceQuery`] values that services resolve through ports.

mod error;
mod ids;
mod outputs;
mod phase;
mod rules;
mod state;

pub use error::{ParsePhaseError, PhaseRuleError, WorkflowDomainError};
pub use ids::WorkItemId;
pub use outputs::{PhaseOutputs, SkipJustification};
pub use phase::{Phase, PhaseTransition};
pub use rules::{
    EvidenceKind, EvidenceQuery, OutputShape, PendingEvidence, PhaseStateMachine, Requirement,
    StartPlan, Subject, TransitionPlan,
};
pub use state::{ActivePhase, PhaseRecord, SkippedPhase, WorkflowState};
