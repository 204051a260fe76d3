//! Keyed persistence port for workflow state.

use crate::workflow::domain::{WorkItemId, WorkflowDomainError, WorkflowState};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for workflow state store operations.
pub type WorkflowStoreResult<T> = Result<T, WorkflowStoreError>;

/// Durable store of one [`WorkflowState`] per work item.
///
/// Writes are compare-and-swap on [`WorkflowState::version`]: a save only
/// succeeds when the stored version still equals the version the caller
/// loaded, so two writers racing on the same work item cannot both win.
/// Different work items never contend.
#[async_trait]
pub trait WorkflowStateStore: Send + Sync {
    /// Loads the state for a work item.
    ///
    /// Returns `None` when no workflow has been recorded for the item.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::Corrupted`] when the stored record cannot
    /// be decoded or violates the phase invariants.
    async fn load(&self, work_item_id: &WorkItemId) -> WorkflowStoreResult<Option<WorkflowState>>;

    /// Atomically replaces the whole record and returns it with its new
    /// version.
    ///
    /// A state with version `0` is inserted and must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::ConcurrentModification`] when the stored
    /// version differs from `state.version()`.
    async fn save(&self, state: &WorkflowState) -> WorkflowStoreResult<WorkflowState>;

    /// Lists every work item with a stored workflow.
    async fn list(&self) -> WorkflowStoreResult<Vec<WorkItemId>>;
}

/// Errors returned by workflow state store implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowStoreError {
    /// Another writer changed the record since it was loaded.
    ///
    /// Transient: reload the state and retry the operation.
    #[error(
        "concurrent modification of work item {work_item_id}: expected version {expected}, found {found}"
    )]
    ConcurrentModification {
        /// Work item whose record changed.
        work_item_id: WorkItemId,
        /// Version the writer loaded.
        expected: u64,
        /// Version currently stored; `0` when absent.
        found: u64,
    },

    /// The stored record is unreadable or inconsistent.
    #[error("corrupted workflow record for {work_item_id}: {reason}")]
    Corrupted {
        /// Work item whose record is corrupted.
        work_item_id: WorkItemId,
        /// Description of the corruption.
        reason: String,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether reloading and retrying may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

impl From<WorkflowDomainError> for WorkflowStoreError {
    fn from(err: WorkflowDomainError) -> Self {
        match err {
            WorkflowDomainError::Inconsistent {
                work_item_id,
                reason,
            } => Self::Corrupted {
                work_item_id,
                reason,
            },
            other @ WorkflowDomainError::InvalidWorkItemId(_) => Self::persistence(other),
        }
    }
}
