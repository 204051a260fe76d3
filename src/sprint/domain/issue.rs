//! Issue records as seen through the tracker port.

use super::TrackerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Open or closed state of a tracker issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    /// The issue is open.
    Open,
    /// The issue is closed.
    Closed,
}

impl IssueState {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of an issue read from the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Tracker identifier.
    pub tracker_id: TrackerId,
    /// Issue title.
    pub title: String,
    /// Open or closed.
    pub state: IssueState,
    /// Every label on the issue, sprint-owned or not.
    pub labels: BTreeSet<String>,
    /// Issue body.
    pub body: String,
}

/// Payload for creating an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    /// Issue title.
    pub title: String,
    /// Rendered issue body.
    pub body: String,
    /// Labels applied at creation.
    pub labels: BTreeSet<String>,
}
