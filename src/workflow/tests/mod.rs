//! Unit tests for the workflow module.
//!
//! Tests are organised by concept: phase values, the persisted record, the
//! rule planner, the enforcer service and the file-backed store.


use crate::workflow::domain::{Phase, PhaseOutputs};

/// Returns outputs that satisfy every local rule of `phase`.
fn valid_outputs(phase: Phase) -> PhaseOutputs {
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
