//! In-memory integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `workflow_enforcement_tests`: Phase lifecycle through the public API
//! - `task_sync_tests`: Sprint documents synced against the in-memory tracker

mod in_memory {
    pub mod helpers;

    mod task_sync_tests;
    mod workflow_enforcement_tests;
}
