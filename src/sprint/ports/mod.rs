//! Port contracts for sprint task synchronisation.

pub mod ledger;
pub mod tracker;

pub use ledger::{SyncLedgerError, SyncLedgerResult, SyncLedgerStore};
pub use tracker::{IssueTrackerClient, TrackerError, TrackerResult, TransientReason};
