//! File-backed workflow state store.
//!
//! One JSON record per work item, named after the work item id. Saves are
//! serialised per work item inside the process and always replace the whole
//! record atomically.

use async_trait::async_trait;
use camino::Utf8Path;
use std::sync::Arc;

use crate::keyed_locks::KeyedLocks;
use crate::record_file::{RecordDir, RecordFileError, run_blocking_with};
use crate::workflow::{
    domain::{WorkItemId, WorkflowState},
    ports::{WorkflowStateStore, WorkflowStoreError, WorkflowStoreResult},
};

/// Workflow state store keeping one record file per work item.
#[derive(Debug, Clone)]
pub struct FileWorkflowStateStore {
    records: Arc<RecordDir>,
    key_locks: Arc<KeyedLocks<WorkItemId>>,
}

impl FileWorkflowStateStore {
    /// Opens a store rooted at `path`, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::Persistence`] when the directory cannot
    /// be opened.
    pub fn open(path: &Utf8Path) -> WorkflowStoreResult<Self> {
        let records = RecordDir::open(path).map_err(WorkflowStoreError::persistence)?;
        Ok(Self::from_record_dir(records))
    }

    /// Creates a store over an already opened record directory.
    #[must_use]
    pub fn from_record_dir(records: RecordDir) -> Self {
        Self {
            records: Arc::new(records),
            key_locks: Arc::new(KeyedLocks::new()),
        }
    }
}

fn map_record_error(work_item_id: &WorkItemId, err: RecordFileError) -> WorkflowStoreError {
    if err.is_corruption() {
        WorkflowStoreError::Corrupted {
            work_item_id: work_item_id.clone(),
            reason: err.to_string(),
        }
    } else {
        WorkflowStoreError::persistence(err)
    }
}

fn read_state(
    records: &RecordDir,
    work_item_id: &WorkItemId,
) -> WorkflowStoreResult<Option<WorkflowState>> {
    let Some(state) = records
        .read::<WorkflowState>(work_item_id.as_str())
        .map_err(|err| map_record_error(work_item_id, err))?
    else {
        return Ok(None);
    };

    if state.work_item_id() != work_item_id {
        return Err(WorkflowStoreError::Corrupted {
            work_item_id: work_item_id.clone(),
            reason: format!("record belongs to {}", state.work_item_id()),
        });
    }
    state.validate()?;
    Ok(Some(state))
}

fn join_error(err: tokio::task::JoinError) -> WorkflowStoreError {
    WorkflowStoreError::persistence(err)
}

#[async_trait]
impl WorkflowStateStore for FileWorkflowStateStore {
    async fn load(&self, work_item_id: &WorkItemId) -> WorkflowStoreResult<Option<WorkflowState>> {
        let records = Arc::clone(&self.records);
        let id = work_item_id.clone();
        run_blocking_with(move || read_state(&records, &id), join_error).await
    }

    async fn save(&self, state: &WorkflowState) -> WorkflowStoreResult<WorkflowState> {
        let lock = self.key_locks.lock_for(state.work_item_id());
        let _guard = lock.lock().await;

        let records = Arc::clone(&self.records);
        let candidate = state.clone();
        run_blocking_with(
            move || {
                let id = candidate.work_item_id().clone();
                let found = read_state(&records, &id)?
                    .as_ref()
                    .map_or(0, WorkflowState::version);
                if found != candidate.version() {
                    return Err(WorkflowStoreError::ConcurrentModification {
                        expected: candidate.version(),
                        work_item_id: id,
                        found,
                    });
                }

                let saved = candidate.with_version(found + 1);
                records
                    .write(id.as_str(), &saved)
                    .map_err(|err| map_record_error(&id, err))?;
                Ok(saved)
            },
            join_error,
        )
        .await
    }

    async fn list(&self) -> WorkflowStoreResult<Vec<WorkItemId>> {
        let records = Arc::clone(&self.records);
        run_blocking_with(
            move || {
                let names = records.names().map_err(WorkflowStoreError::persistence)?;
                Ok(names
                    .into_iter()
                    .filter_map(|name| WorkItemId::new(name).ok())
                    .collect())
            },
            join_error,
        )
        .await
    }
}
