//! Audit trail of a sync pass.

use super::{IssueState, TaskKey, TaskModel, TrackerId};
use std::fmt;

/// What a soft failure was about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSubject {
    /// A task in the plan.
    Task(TaskKey),
    /// A previously linked issue whose task left the plan.
    Orphan(TrackerId),
    /// The record of links kept between passes.
    Ledger,
}

impl fmt::Display for SyncSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(key) => write!(f, "task {key}"),
            Self::Orphan(tracker_id) => write!(f, "orphan #{tracker_id}"),
            Self::Ledger => f.write_str("sync ledger"),
        }
    }
}

/// Step of the pass at which a soft failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    /// Reading the linked issue.
    Lookup,
    /// Creating the issue.
    Create,
    /// Opening or closing the issue.
    SetState,
    /// Adding labels.
    AddLabels,
    /// Removing labels.
    RemoveLabels,
    /// Commenting on the issue.
    Comment,
    /// Persisting the ledger.
    PersistLedger,
}

impl SyncStage {
    /// Returns the stage name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Create => "create",
            Self::SetState => "set_state",
            Self::AddLabels => "add_labels",
            Self::RemoveLabels => "remove_labels",
            Self::Comment => "comment",
            Self::PersistLedger => "persist_ledger",
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote change applied, or attempted, during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// An issue was created for a task.
    Created {
        /// Task the issue belongs to.
        task: TaskKey,
        /// New issue.
        tracker_id: TrackerId,
        /// Stale link the new issue replaces, if the old one was gone.
        replaced: Option<TrackerId>,
    },
    /// An issue was opened or closed to match its phase status.
    StateChanged {
        /// Task the issue belongs to.
        task: TaskKey,
        /// Changed issue.
        tracker_id: TrackerId,
        /// State before the change.
        from: IssueState,
        /// State after the change.
        to: IssueState,
    },
    /// Sprint labels were added in one batched call.
    LabelsAdded {
        /// Task the issue belongs to.
        task: TaskKey,
        /// Labelled issue.
        tracker_id: TrackerId,
        /// Added labels, sorted.
        labels: Vec<String>,
    },
    /// Sprint labels were removed in one batched call.
    LabelsRemoved {
        /// Task the issue belongs to.
        task: TaskKey,
        /// Unlabelled issue.
        tracker_id: TrackerId,
        /// Removed labels, sorted.
        labels: Vec<String>,
    },
    /// An issue whose task left the plan was closed.
    OrphanClosed {
        /// Orphaned issue.
        tracker_id: TrackerId,
        /// Task it used to belong to.
        task: TaskKey,
        /// Whether the issue was still open and had to be closed.
        was_open: bool,
        /// Whether the explanatory comment was posted.
        commented: bool,
    },
    /// A step failed; the pass carried on with the next item.
    Failed {
        /// What the failure was about.
        subject: SyncSubject,
        /// Where it failed.
        stage: SyncStage,
        /// Rendered error.
        error: String,
    },
}

impl SyncAction {
    /// Returns whether this entry records a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcome of one sync pass.
///
/// Actions are an audit trail; correctness never depends on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The plan with tracker ids filled in.
    pub model: TaskModel,
    /// Applied and failed actions in the order they happened.
    pub actions: Vec<SyncAction>,
    /// Whether the pass stopped early because it was cancelled.
    pub cancelled: bool,
}

impl SyncReport {
    /// Returns whether the pass changed nothing and failed nowhere.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterates over soft failures.
    pub fn failures(&self) -> impl Iterator<Item = &SyncAction> {
        self.actions.iter().filter(|action| action.is_failure())
    }

    /// Returns whether any step failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.actions.iter().any(SyncAction::is_failure)
    }
}
