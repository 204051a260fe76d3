//! Shared test helpers for in-memory integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use shipwright::{
    sprint::{
        adapters::{
            memory::{InMemoryIssueTracker, InMemorySyncLedger},
            retry::{RetryPolicy, RetryingTracker},
        },
        services::{SyncConfig, TaskSyncEngine},
    },
    workflow::{
        adapters::memory::{InMemoryWorkflowStateStore, StaticEvidence},
        domain::{Phase, PhaseOutputs},
        services::WorkflowEnforcer,
    },
};

/// Enforcer wired to in-memory adapters.
pub type MemoryEnforcer =
    WorkflowEnforcer<InMemoryWorkflowStateStore, StaticEvidence, DefaultClock>;

/// Sync engine wired to a retrying in-memory tracker.
pub type MemorySyncEngine =
    TaskSyncEngine<RetryingTracker<InMemoryIssueTracker>, InMemorySyncLedger>;

/// Sprint plan used across sync tests.
pub const PAYMENTS_PLAN: &str = r#"
sprint: payments-hardening
labels: ["sprint:payments"]
phases:
  - name: Infra
    status: in_progress
    tasks:
      - title: Add healthcheck
        description: Expose /healthz
        labels: ["priority:high"]
      - title: Wire alerts
        depends_on: [Add healthcheck]
  - name: Rollout
    status: pending
    tasks:
      - title: Enable in production
"#;

/// Enforcer plus the evidence source it consults.
pub struct EnforcerHarness {
    pub evidence: Arc<StaticEvidence>,
    pub enforcer: MemoryEnforcer,
}

/// Provides an enforcer whose evidence source confirms nothing yet.
#[fixture]
pub fn enforcer_harness() -> EnforcerHarness {
    let evidence = Arc::new(StaticEvidence::new());
    let enforcer = WorkflowEnforcer::new(
        Arc::new(InMemoryWorkflowStateStore::new()),
        Arc::clone(&evidence),
        Arc::new(DefaultClock),
    );
    EnforcerHarness { evidence, enforcer }
}

/// Sync engine plus the fake tracker behind it.
pub struct SyncHarness {
    pub tracker: Arc<InMemoryIssueTracker>,
    pub engine: MemorySyncEngine,
}

/// Provides a sync engine retrying transient failures without delay.
#[fixture]
pub fn sync_harness() -> SyncHarness {
    let tracker = Arc::new(InMemoryIssueTracker::new().with_starting_number(50));
    let engine = TaskSyncEngine::new(
        Arc::new(RetryingTracker::new(
            Arc::clone(&tracker),
            RetryPolicy::immediate(3),
        )),
        Arc::new(InMemorySyncLedger::new()),
        SyncConfig::default(),
    );
    SyncHarness { tracker, engine }
}

/// Returns outputs satisfying the local rules of `phase`.
#[must_use]
pub fn outputs_for(phase: Phase) -> PhaseOutputs {
    match phase {
        Phase::Investigation => PhaseOutputs::new().with("findings", "docs/findings.md"),
        Phase::Planning => PhaseOutputs::new()
            .with("task_breakdown", "docs/tasks.yaml")
            .with("execution_plan", "docs/plan.md"),
        Phase::Implementation => PhaseOutputs::new().with("branch", "feat/healthcheck"),
        Phase::Validation => PhaseOutputs::new()
            .with("tests_passed", true)
            .with("lint_passed", true),
        Phase::Publication => PhaseOutputs::new().with("published_ref", "pr/51"),
        Phase::Monitoring => PhaseOutputs::new().with("status", "merged"),
    }
}
