//! Scripted evidence provider for tests and dry runs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::{EvidenceKind, EvidenceQuery, WorkItemId},
    ports::{EvidenceError, EvidenceProvider, EvidenceResult},
};

/// Evidence provider answering from an explicit allow-list.
///
/// Queries are confirmed when they were granted exactly, when their whole
/// kind was granted, or when the provider is permissive. Everything else is
/// refused.
#[derive(Debug, Clone, Default)]
pub struct StaticEvidence {
    state: Arc<RwLock<EvidenceState>>,
}

#[derive(Debug, Default)]
struct EvidenceState {
    granted: HashSet<EvidenceQuery>,
    granted_kinds: HashSet<EvidenceKind>,
    permissive: bool,
}

fn lock_error(err: &impl std::fmt::Display) -> EvidenceError {
    EvidenceError::lookup(std::io::Error::other(err.to_string()))
}

impl StaticEvidence {
    /// Creates a provider that refuses everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that confirms every query.
    #[must_use]
    pub fn permissive() -> Self {
        let provider = Self::default();
        if let Ok(mut state) = provider.state.write() {
            state.permissive = true;
        }
        provider
    }

    /// Confirms one specific query.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Lookup`] when lock acquisition fails.
    pub fn grant(&self, query: EvidenceQuery) -> EvidenceResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.granted.insert(query);
        Ok(())
    }

    /// Confirms every query of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Lookup`] when lock acquisition fails.
    pub fn grant_kind(&self, kind: EvidenceKind) -> EvidenceResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.granted_kinds.insert(kind);
        Ok(())
    }

    /// Withdraws a previously granted query.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Lookup`] when lock acquisition fails.
    pub fn revoke(&self, query: &EvidenceQuery) -> EvidenceResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.granted.remove(query);
        Ok(())
    }
}

#[async_trait]
impl EvidenceProvider for StaticEvidence {
    async fn check(
        &self,
        _work_item_id: &WorkItemId,
        query: &EvidenceQuery,
    ) -> EvidenceResult<bool> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.permissive
            || state.granted_kinds.contains(&query.kind)
            || state.granted.contains(query))
    }
}
