//! In-memory adapters for sprint ports.

mod ledger;
mod tracker;

pub use ledger::InMemorySyncLedger;
pub use tracker::{InMemoryIssueTracker, TrackerCall, TrackerCallKind};
