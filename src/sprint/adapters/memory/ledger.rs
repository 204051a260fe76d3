//! In-memory sync ledger store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::sprint::{
    domain::SyncLedger,
    ports::{SyncLedgerError, SyncLedgerResult, SyncLedgerStore},
};

/// Thread-safe in-memory ledger store.
#[derive(Debug, Clone, Default)]
pub struct InMemorySyncLedger {
    ledgers: Arc<RwLock<HashMap<String, SyncLedger>>>,
}

impl InMemorySyncLedger {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl std::fmt::Display) -> SyncLedgerError {
    SyncLedgerError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl SyncLedgerStore for InMemorySyncLedger {
    async fn load(&self, sprint: &str) -> SyncLedgerResult<SyncLedger> {
        let ledgers = self.ledgers.read().map_err(|err| lock_error(&err))?;
        Ok(ledgers.get(sprint).cloned().unwrap_or_default())
    }

    async fn save(&self, sprint: &str, ledger: &SyncLedger) -> SyncLedgerResult<()> {
        let mut ledgers = self.ledgers.write().map_err(|err| lock_error(&err))?;
        ledgers.insert(sprint.to_owned(), ledger.clone());
        Ok(())
    }
}
