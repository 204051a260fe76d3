//! Workflow phases and the transitions that settle them.

use super::{ParsePhaseError, PhaseOutputs, SkipJustification};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered stage of the enforced delivery workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Understand the problem before committing to a plan.
    Investigation,
    /// Produce the task breakdown and execution plan.
    Planning,
    /// Write the change on a working branch.
    Implementation,
    /// Prove the change with tests and linters.
    Validation,
    /// Publish the change for review, typically as a pull request.
    Publication,
    /// Watch the published change until it lands.
    Monitoring,
}

impl Phase {
    /// Every phase in execution order.
    pub const ALL: [Self; 6] = [
        Self::Investigation,
        Self::Planning,
        Self::Implementation,
        Self::Validation,
        Self::Publication,
        Self::Monitoring,
    ];

    /// Returns the zero-based position of the phase.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Investigation => 0,
            Self::Planning => 1,
            Self::Implementation => 2,
            Self::Validation => 3,
            Self::Publication => 4,
            Self::Monitoring => 5,
        }
    }

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Investigation => "investigation",
            Self::Planning => "planning",
            Self::Implementation => "implementation",
            Self::Validation => "validation",
            Self::Publication => "publication",
            Self::Monitoring => "monitoring",
        }
    }

    /// Returns the phase that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Investigation => Some(Self::Planning),
            Self::Planning => Some(Self::Implementation),
            Self::Implementation => Some(Self::Validation),
            Self::Validation => Some(Self::Publication),
            Self::Publication => Some(Self::Monitoring),
            Self::Monitoring => None,
        }
    }

    /// Returns whether this is the terminal phase.
    ///
    /// The terminal phase may be re-entered to record monitoring updates.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Monitoring)
    }

    /// Returns whether the phase may be bypassed with a justification.
    #[must_use]
    pub const fn is_skippable(self) -> bool {
        matches!(self, Self::Investigation)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Phase {
    type Error = ParsePhaseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str() == normalized)
            .ok_or_else(|| ParsePhaseError(value.to_owned()))
    }
}

/// How a phase is settled.
///
/// Completion and skipping share one validation path in
/// [`super::PhaseStateMachine::plan_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseTransition {
    /// The phase ran and produced these outputs.
    Completed(PhaseOutputs),
    /// The phase was bypassed for the recorded reason.
    Skipped(SkipJustification),
}
