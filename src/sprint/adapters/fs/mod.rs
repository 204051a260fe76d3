//! Filesystem adapters for sprint ports.

mod ledger;

pub use ledger::FileSyncLedger;
