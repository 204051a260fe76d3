//! Issue tracker port.

use crate::sprint::domain::{IssueRecord, IssueState, NewIssue, TrackerId};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for issue tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Remote issue tracker used by the sync engine.
///
/// Every method must be safe to retry: setting an issue to the state it is
/// already in, adding a label it already has or removing one it lacks are
/// no-ops.
#[async_trait]
pub trait IssueTrackerClient: Send + Sync {
    /// Creates an issue and returns its identifier.
    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<TrackerId>;

    /// Fetches an issue.
    ///
    /// Returns `None` when the issue does not exist (anymore).
    async fn get_issue(&self, tracker_id: &TrackerId) -> TrackerResult<Option<IssueRecord>>;

    /// Opens or closes an issue.
    async fn set_issue_state(&self, tracker_id: &TrackerId, state: IssueState)
    -> TrackerResult<()>;

    /// Adds several labels in one call.
    async fn add_labels(&self, tracker_id: &TrackerId, labels: &[String]) -> TrackerResult<()>;

    /// Removes several labels in one call.
    async fn remove_labels(&self, tracker_id: &TrackerId, labels: &[String])
    -> TrackerResult<()>;

    /// Posts a comment.
    async fn add_comment(&self, tracker_id: &TrackerId, body: &str) -> TrackerResult<()>;
}

/// Why a tracker call failed transiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientReason {
    /// The tracker asked the caller to slow down.
    RateLimited {
        /// Wait requested by the tracker, if it named one.
        retry_after: Option<Duration>,
    },
    /// The call did not complete in time.
    Timeout,
}

impl fmt::Display for TransientReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited {
                retry_after: Some(wait),
            } => write!(f, "rate limited, retry after {}ms", wait.as_millis()),
            Self::RateLimited { retry_after: None } => f.write_str("rate limited"),
            Self::Timeout => f.write_str("timed out"),
        }
    }
}

/// Errors returned by issue tracker implementations.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// The issue does not exist.
    #[error("issue #{0} not found")]
    NotFound(TrackerId),

    /// A failure that may go away on retry.
    #[error("transient tracker failure: {reason}")]
    Transient {
        /// Kind of transient failure.
        reason: TransientReason,
    },

    /// The tracker refused the request.
    #[error("tracker rejected the request: {reason}")]
    Rejected {
        /// Message returned by the tracker.
        reason: String,
    },

    /// The tracker could not be reached.
    #[error("tracker transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl TrackerError {
    /// Creates a rate limit error.
    #[must_use]
    pub const fn rate_limited(retry_after: Option<Duration>) -> Self {
        Self::Transient {
            reason: TransientReason::RateLimited { retry_after },
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub const fn timeout() -> Self {
        Self::Transient {
            reason: TransientReason::Timeout,
        }
    }

    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns whether retrying the call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns the wait requested by a rate limit, if any.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Transient {
                reason: TransientReason::RateLimited { retry_after },
            } => *retry_after,
            Self::Transient { .. }
            | Self::NotFound(_)
            | Self::Rejected { .. }
            | Self::Transport(_) => None,
        }
    }
}
