//! Error types for workflow phase rules and domain parsing.

use super::{Phase, WorkItemId};
use thiserror::Error;

/// Rule violations raised while starting, completing or skipping a phase.
///
/// These are caller mistakes or incomplete work. They are never retried
/// automatically and always name the unmet condition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhaseRuleError {
    /// A prerequisite for the requested phase does not hold.
    #[error("work item {work_item_id}: {phase} prerequisite '{condition}' is not met")]
    Prerequisite {
        /// Work item the request targeted.
        work_item_id: WorkItemId,
        /// Phase that was requested.
        phase: Phase,
        /// Name of the unmet condition.
        condition: String,
    },

    /// A submitted output is missing, malformed or not backed by evidence.
    #[error("work item {work_item_id}: {phase} output '{output}' is invalid: {reason}")]
    OutputValidation {
        /// Work item the request targeted.
        work_item_id: WorkItemId,
        /// Phase being completed.
        phase: Phase,
        /// Name of the failing output requirement.
        output: String,
        /// Why the output was rejected.
        reason: String,
    },

    /// The phase cannot be skipped with the given justification.
    #[error("work item {work_item_id}: {phase} cannot be skipped: {reason}")]
    SkipNotAllowed {
        /// Work item the request targeted.
        work_item_id: WorkItemId,
        /// Phase the caller tried to skip.
        phase: Phase,
        /// Why the skip was refused.
        reason: String,
    },

    /// The phase was already completed or skipped with a different result.
    #[error("work item {work_item_id}: {phase} is already settled")]
    PhaseAlreadySettled {
        /// Work item the request targeted.
        work_item_id: WorkItemId,
        /// Phase that is already settled.
        phase: Phase,
    },
}

impl PhaseRuleError {
    /// Returns the phase the violation refers to.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Prerequisite { phase, .. }
            | Self::OutputValidation { phase, .. }
            | Self::SkipNotAllowed { phase, .. }
            | Self::PhaseAlreadySettled { phase, .. } => *phase,
        }
    }
}

/// Errors raised while constructing or reconstructing workflow values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowDomainError {
    /// The work item identifier is empty or contains unsupported characters.
    #[error("invalid work item id '{0}', expected [A-Za-z0-9._-]+")]
    InvalidWorkItemId(String),

    /// A reconstructed workflow record violates the phase invariants.
    #[error("workflow record for {work_item_id} is inconsistent: {reason}")]
    Inconsistent {
        /// Work item whose record is inconsistent.
        work_item_id: WorkItemId,
        /// Description of the broken invariant.
        reason: String,
    },
}

/// Error returned while parsing a phase name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown workflow phase: {0}")]
pub struct ParsePhaseError(pub String);
