//! File-backed sync ledger store.
//!
//! Each sprint's ledger is one record file. The file name is the sprint name
//! reduced to safe characters plus a short digest of the full name, so
//! distinct sprints never share a file.

use async_trait::async_trait;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::record_file::{RecordDir, RecordFileError, hex, run_blocking_with};
use crate::sprint::{
    domain::{SyncLedger, TaskKey, TrackerId},
    ports::{SyncLedgerError, SyncLedgerResult, SyncLedgerStore},
};

const MAX_STEM_CHARS: usize = 48;
const DIGEST_BYTES: usize = 6;

/// Ledger store keeping one record file per sprint.
#[derive(Debug, Clone)]
pub struct FileSyncLedger {
    records: Arc<RecordDir>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRecord {
    sprint: String,
    links: Vec<LinkRecord>,
    managed_labels: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkRecord {
    phase: String,
    title: String,
    tracker_id: TrackerId,
}

impl FileSyncLedger {
    /// Opens a store rooted at `path`, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`SyncLedgerError::Persistence`] when the directory cannot be
    /// opened.
    pub fn open(path: &Utf8Path) -> SyncLedgerResult<Self> {
        let records = RecordDir::open(path).map_err(SyncLedgerError::persistence)?;
        Ok(Self::from_record_dir(records))
    }

    /// Creates a store over an already opened record directory.
    #[must_use]
    pub fn from_record_dir(records: RecordDir) -> Self {
        Self {
            records: Arc::new(records),
        }
    }
}

/// Returns the record name holding the ledger of `sprint`.
fn record_name(sprint: &str) -> String {
    let stem: String = sprint
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .take(MAX_STEM_CHARS)
        .collect();
    let digest = Sha256::digest(sprint.as_bytes());
    let short: Vec<u8> = digest.iter().take(DIGEST_BYTES).copied().collect();
    format!("ledger-{stem}-{}", hex(&short))
}

fn map_record_error(sprint: &str, err: RecordFileError) -> SyncLedgerError {
    if err.is_corruption() {
        SyncLedgerError::Corrupted {
            sprint: sprint.to_owned(),
            reason: err.to_string(),
        }
    } else {
        SyncLedgerError::persistence(err)
    }
}

fn join_error(err: tokio::task::JoinError) -> SyncLedgerError {
    SyncLedgerError::persistence(err)
}

#[async_trait]
impl SyncLedgerStore for FileSyncLedger {
    async fn load(&self, sprint: &str) -> SyncLedgerResult<SyncLedger> {
        let records = Arc::clone(&self.records);
        let owned = sprint.to_owned();
        run_blocking_with(
            move || {
                let Some(record) = records
                    .read::<LedgerRecord>(&record_name(&owned))
                    .map_err(|err| map_record_error(&owned, err))?
                else {
                    return Ok(SyncLedger::default());
                };
                if record.sprint != owned {
                    return Err(SyncLedgerError::Corrupted {
                        reason: format!("record belongs to sprint '{}'", record.sprint),
                        sprint: owned,
                    });
                }
                let links = record
                    .links
                    .into_iter()
                    .map(|link| (link.tracker_id, TaskKey::new(link.phase, link.title)))
                    .collect();
                Ok(SyncLedger::new(
                    links,
                    record.managed_labels.into_iter().collect(),
                ))
            },
            join_error,
        )
        .await
    }

    async fn save(&self, sprint: &str, ledger: &SyncLedger) -> SyncLedgerResult<()> {
        let records = Arc::clone(&self.records);
        let record = LedgerRecord {
            sprint: sprint.to_owned(),
            links: ledger
                .links()
                .iter()
                .map(|(tracker_id, key)| LinkRecord {
                    phase: key.phase().to_owned(),
                    title: key.title().to_owned(),
                    tracker_id: tracker_id.clone(),
                })
                .collect(),
            managed_labels: ledger.managed_labels().iter().cloned().collect(),
        };
        run_blocking_with(
            move || {
                records
                    .write(&record_name(&record.sprint), &record)
                    .map_err(|err| map_record_error(&record.sprint, err))
            },
            join_error,
        )
        .await
    }
}
