//! In-memory workflow state store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::{WorkItemId, WorkflowState},
    ports::{WorkflowStateStore, WorkflowStoreError, WorkflowStoreResult},
};

/// Thread-safe in-memory workflow state store.
///
/// The compare-and-swap happens under a single write lock, so racing saves
/// for the same work item resolve to exactly one winner.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowStateStore {
    states: Arc<RwLock<HashMap<WorkItemId, WorkflowState>>>,
}

impl InMemoryWorkflowStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl std::fmt::Display) -> WorkflowStoreError {
    WorkflowStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl WorkflowStateStore for InMemoryWorkflowStateStore {
    async fn load(&self, work_item_id: &WorkItemId) -> WorkflowStoreResult<Option<WorkflowState>> {
        let states = self.states.read().map_err(|err| lock_error(&err))?;
        Ok(states.get(work_item_id).cloned())
    }

    async fn save(&self, state: &WorkflowState) -> WorkflowStoreResult<WorkflowState> {
        let mut states = self.states.write().map_err(|err| lock_error(&err))?;
        let found = states
            .get(state.work_item_id())
            .map_or(0, WorkflowState::version);
        if found != state.version() {
            return Err(WorkflowStoreError::ConcurrentModification {
                work_item_id: state.work_item_id().clone(),
                expected: state.version(),
                found,
            });
        }

        let saved = state.clone().with_version(found + 1);
        states.insert(saved.work_item_id().clone(), saved.clone());
        Ok(saved)
    }

    async fn list(&self) -> WorkflowStoreResult<Vec<WorkItemId>> {
        let states = self.states.read().map_err(|err| lock_error(&err))?;
        let mut ids: Vec<WorkItemId> = states.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
