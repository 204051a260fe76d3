//! Shared world state for sprint synchronisation BDD scenarios.

use std::sync::Arc;

use rstest::fixture;
use shipwright::sprint::{
    adapters::memory::{InMemoryIssueTracker, InMemorySyncLedger},
    domain::{PhaseStatus, SprintPhase, SprintTask, SyncReport, TaskModel},
    services::{SyncConfig, SyncError, TaskSyncEngine},
};

/// Engine type used by the BDD world.
pub type TestSyncEngine = TaskSyncEngine<InMemoryIssueTracker, InMemorySyncLedger>;

/// Scenario world for sprint synchronisation behaviour tests.
pub struct SyncWorld {
    pub tracker: Arc<InMemoryIssueTracker>,
    pub engine: TestSyncEngine,
    pub sprint: String,
    pub phase_name: String,
    pub phase_status: PhaseStatus,
    pub tasks: Vec<SprintTask>,
    pub last_result: Option<Result<SyncReport, SyncError>>,
}

impl SyncWorld {
    /// Creates a world with an empty tracker and ledger.
    #[must_use]
    pub fn new() -> Self {
        let tracker = Arc::new(InMemoryIssueTracker::new());
        let engine = TaskSyncEngine::new(
            Arc::clone(&tracker),
            Arc::new(InMemorySyncLedger::new()),
            SyncConfig::default(),
        );
        Self {
            tracker,
            engine,
            sprint: String::new(),
            phase_name: String::new(),
            phase_status: PhaseStatus::Pending,
            tasks: Vec::new(),
            last_result: None,
        }
    }

    /// Starts over with a tracker numbering issues from `number`.
    pub fn restart_numbering(&mut self, number: u64) {
        let tracker = Arc::new(InMemoryIssueTracker::new().with_starting_number(number));
        self.engine = TaskSyncEngine::new(
            Arc::clone(&tracker),
            Arc::new(InMemorySyncLedger::new()),
            SyncConfig::default(),
        );
        self.tracker = tracker;
    }

    /// Builds the plan described so far.
    #[must_use]
    pub fn plan(&self) -> TaskModel {
        TaskModel::new(self.sprint.as_str()).with_phase(
            SprintPhase::new(self.phase_name.as_str(), self.phase_status)
                .with_tasks(self.tasks.iter().cloned()),
        )
    }

    /// Returns the report of the last successful pass.
    ///
    /// # Errors
    ///
    /// Returns an error when no pass ran or the last pass failed.
    pub fn last_report(&self) -> Result<&SyncReport, eyre::Report> {
        match self.last_result.as_ref() {
            Some(Ok(report)) => Ok(report),
            Some(Err(err)) => Err(eyre::eyre!("last sync failed: {err}")),
            None => Err(eyre::eyre!("no sync pass has run")),
        }
    }
}

impl Default for SyncWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> SyncWorld {
    SyncWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
