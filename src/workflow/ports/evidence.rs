//! Evidence port consulted before phase transitions.

use crate::workflow::domain::{EvidenceQuery, WorkItemId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for evidence lookups.
pub type EvidenceResult<T> = Result<T, EvidenceError>;

/// Caller-supplied predicates over the outside world.
///
/// The enforcer never touches the filesystem, git or CI itself; it asks this
/// port whether an artifact exists, whether tests passed and so on.
#[async_trait]
pub trait EvidenceProvider: Send + Sync {
    /// Answers `query` for `work_item_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError`] when the evidence cannot be gathered. A
    /// negative answer is `Ok(false)`, not an error.
    async fn check(&self, work_item_id: &WorkItemId, query: &EvidenceQuery)
    -> EvidenceResult<bool>;
}

/// Errors returned by evidence providers.
#[derive(Debug, Clone, Error)]
pub enum EvidenceError {
    /// The provider does not know how to answer this query.
    #[error("unsupported evidence query: {0}")]
    Unsupported(EvidenceQuery),

    /// Gathering the evidence failed.
    #[error("evidence lookup failed: {0}")]
    Lookup(Arc<dyn std::error::Error + Send + Sync>),
}

impl EvidenceError {
    /// Wraps a lookup failure.
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lookup(Arc::new(err))
    }
}
