//! Shared world state for workflow phase BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use shipwright::workflow::{
    adapters::memory::{InMemoryWorkflowStateStore, StaticEvidence},
    domain::{Phase, WorkItemId, WorkflowState},
    services::{WorkflowEnforcer, WorkflowEnforcerError},
};

/// Enforcer type used by the BDD world.
pub type TestEnforcer = WorkflowEnforcer<InMemoryWorkflowStateStore, StaticEvidence, DefaultClock>;

/// Scenario world for workflow phase behaviour tests.
pub struct WorkflowWorld {
    pub evidence: Arc<StaticEvidence>,
    pub enforcer: TestEnforcer,
    pub work_item_id: WorkItemId,
    pub last_result: Option<Result<WorkflowState, WorkflowEnforcerError>>,
}

impl WorkflowWorld {
    /// Creates a world with no recorded workflows and no evidence.
    #[must_use]
    pub fn new() -> Self {
        let evidence = Arc::new(StaticEvidence::new());
        let enforcer = WorkflowEnforcer::new(
            Arc::new(InMemoryWorkflowStateStore::new()),
            Arc::clone(&evidence),
            Arc::new(DefaultClock),
        );
        Self {
            evidence,
            enforcer,
            work_item_id: WorkItemId::from(1),
            last_result: None,
        }
    }

    /// Returns the error of the last request.
    ///
    /// # Errors
    ///
    /// Returns an error when no request ran or the last one succeeded.
    pub fn last_error(&self) -> Result<&WorkflowEnforcerError, eyre::Report> {
        match self.last_result.as_ref() {
            Some(Err(err)) => Ok(err),
            Some(Ok(state)) => Err(eyre::eyre!(
                "expected a refusal, request succeeded at {}",
                state.current_phase()
            )),
            None => Err(eyre::eyre!("no request has run")),
        }
    }
}

impl Default for WorkflowWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> WorkflowWorld {
    WorkflowWorld::default()
}

/// Parses a phase name written in a scenario.
///
/// # Errors
///
/// Returns an error for unknown phase names.
pub fn phase(name: &str) -> Result<Phase, eyre::Report> {
    Phase::try_from(name).map_err(|err| eyre::eyre!("invalid phase in scenario: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
