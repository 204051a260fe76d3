//! Links and label vocabulary remembered between sync passes.

use super::{TaskKey, TrackerId};
use std::collections::{BTreeMap, BTreeSet};

/// What the previous sync pass linked and managed for one sprint.
///
/// Orphan detection only considers issues recorded here, so issues the sprint
/// never created or linked are left alone. Links are keyed by issue because
/// an issue whose orphan handling failed stays recorded under its old task
/// even when that task has since been linked elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncLedger {
    links: BTreeMap<TrackerId, TaskKey>,
    managed_labels: BTreeSet<String>,
}

impl SyncLedger {
    /// Creates a ledger from links and the managed label vocabulary.
    #[must_use]
    pub const fn new(
        links: BTreeMap<TrackerId, TaskKey>,
        managed_labels: BTreeSet<String>,
    ) -> Self {
        Self {
            links,
            managed_labels,
        }
    }

    /// Returns links in issue order.
    #[must_use]
    pub const fn links(&self) -> &BTreeMap<TrackerId, TaskKey> {
        &self.links
    }

    /// Returns an issue the previous pass linked to `key`.
    #[must_use]
    pub fn link_for(&self, key: &TaskKey) -> Option<&TrackerId> {
        self.links
            .iter()
            .find_map(|(tracker_id, linked)| (linked == key).then_some(tracker_id))
    }

    /// Returns the labels the previous pass controlled.
    #[must_use]
    pub const fn managed_labels(&self) -> &BTreeSet<String> {
        &self.managed_labels
    }

    /// Returns whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.managed_labels.is_empty()
    }
}
