//! Application services for sprint task synchronisation.

mod config;
mod sync;

pub use config::{DEFAULT_ISSUE_BODY_TEMPLATE, SyncConfig};
pub use sync::{SyncError, SyncResult, TaskSyncEngine};
