//! Structural errors for sprint task models.

use super::TrackerId;
use thiserror::Error;

/// Problems that prevent working out the desired tracker state.
///
/// These are fatal for a sync pass: nothing is sent to the tracker when the
/// model is malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SprintDomainError {
    /// The sprint has no name.
    #[error("sprint name must not be empty")]
    EmptySprintName,

    /// A phase has no name.
    #[error("phase {index} has an empty name")]
    EmptyPhaseName {
        /// Zero-based position of the phase.
        index: usize,
    },

    /// Two phases share a name.
    #[error("phase '{name}' is declared more than once")]
    DuplicatePhase {
        /// Repeated phase name.
        name: String,
    },

    /// A task has no title.
    #[error("phase '{phase}' contains a task with an empty title")]
    EmptyTaskTitle {
        /// Phase containing the task.
        phase: String,
    },

    /// Two tasks in one phase share a title.
    #[error("task '{title}' appears more than once in phase '{phase}'")]
    DuplicateTask {
        /// Phase containing the tasks.
        phase: String,
        /// Repeated title.
        title: String,
    },

    /// One tracker issue is linked from two tasks.
    #[error("issue #{tracker_id} is linked from both {first} and {second}")]
    DuplicateTrackerLink {
        /// Issue linked twice.
        tracker_id: TrackerId,
        /// First task linking the issue, as `phase/title`.
        first: String,
        /// Second task linking the issue, as `phase/title`.
        second: String,
    },

    /// A tracker issue reference is empty or malformed.
    #[error("invalid tracker issue reference '{0}'")]
    InvalidTrackerId(String),

    /// A phase status is not one of the known values.
    #[error("unknown phase status '{0}', expected pending, in_progress, completed or blocked")]
    UnknownPhaseStatus(String),
}
