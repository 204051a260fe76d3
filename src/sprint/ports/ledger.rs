//! Persistence port for the per-sprint sync ledger.

use crate::sprint::domain::SyncLedger;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for ledger store operations.
pub type SyncLedgerResult<T> = Result<T, SyncLedgerError>;

/// Store of the ledger each sprint's sync passes hand to one another.
#[async_trait]
pub trait SyncLedgerStore: Send + Sync {
    /// Loads the ledger of `sprint`; an unknown sprint has an empty ledger.
    async fn load(&self, sprint: &str) -> SyncLedgerResult<SyncLedger>;

    /// Replaces the ledger of `sprint`.
    async fn save(&self, sprint: &str, ledger: &SyncLedger) -> SyncLedgerResult<()>;
}

/// Errors returned by ledger stores.
#[derive(Debug, Clone, Error)]
pub enum SyncLedgerError {
    /// The stored ledger is unreadable.
    #[error("corrupted sync ledger for sprint '{sprint}': {reason}")]
    Corrupted {
        /// Sprint whose ledger is corrupted.
        sprint: String,
        /// Description of the corruption.
        reason: String,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SyncLedgerError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
