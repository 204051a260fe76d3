//! Retrying decorator for issue tracker clients.
//!
//! Only transient failures (rate limits and timeouts) are retried, with a
//! capped exponential backoff. A rate limit that names its own wait is
//! honoured, up to the same cap.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::sprint::{
    domain::{IssueRecord, IssueState, NewIssue, TrackerId},
    ports::{IssueTrackerClient, TrackerResult},
};

/// Backoff settings for tracker calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per call, counting the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    #[serde(with = "millis")]
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    #[serde(with = "millis")]
    pub max_delay: Duration,
    /// Factor applied to the delay after each retry.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Policy that makes exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Policy for calls to a hosted tracker over the network.
    #[must_use]
    pub const fn network() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
        }
    }

    /// Policy retrying without waiting, for tests and local fakes.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Returns the delay before retry number `retry` (starting at 1).
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.saturating_pow(retry - 1);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Issue tracker decorator that retries transient failures.
#[derive(Debug, Clone)]
pub struct RetryingTracker<T: IssueTrackerClient> {
    inner: Arc<T>,
    policy: RetryPolicy,
}

impl<T: IssueTrackerClient> RetryingTracker<T> {
    /// Wraps `inner` with `policy`.
    #[must_use]
    pub const fn new(inner: Arc<T>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the wrapped client.
    #[must_use]
    pub const fn inner(&self) -> &Arc<T> {
        &self.inner
    }

    async fn with_retry<R, F, Fut>(&self, operation: &'static str, mut call: F) -> TrackerResult<R>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = TrackerResult<R>> + Send,
        R: Send,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = err.retry_after().map_or_else(
                        || self.policy.delay_for_retry(attempt),
                        |wait| wait.min(self.policy.max_delay),
                    );
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "retrying tracker call"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl<T: IssueTrackerClient> IssueTrackerClient for RetryingTracker<T> {
    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<TrackerId> {
        self.with_retry("create_issue", || self.inner.create_issue(issue))
            .await
    }

    async fn get_issue(&self, tracker_id: &TrackerId) -> TrackerResult<Option<IssueRecord>> {
        self.with_retry("get_issue", || self.inner.get_issue(tracker_id))
            .await
    }

    async fn set_issue_state(
        &self,
        tracker_id: &TrackerId,
        state: IssueState,
    ) -> TrackerResult<()> {
        self.with_retry("set_issue_state", || {
            self.inner.set_issue_state(tracker_id, state)
        })
        .await
    }

    async fn add_labels(&self, tracker_id: &TrackerId, labels: &[String]) -> TrackerResult<()> {
        self.with_retry("add_labels", || self.inner.add_labels(tracker_id, labels))
            .await
    }

    async fn remove_labels(&self, tracker_id: &TrackerId, labels: &[String]) -> TrackerResult<()> {
        self.with_retry("remove_labels", || {
            self.inner.remove_labels(tracker_id, labels)
        })
        .await
    }

    async fn add_comment(&self, tracker_id: &TrackerId, body: &str) -> TrackerResult<()> {
        self.with_retry("add_comment", || self.inner.add_comment(tracker_id, body))
            .await
    }
}
