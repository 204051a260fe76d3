//! Unit tests for sprint synchronisation.
//!
//! Tests are organised by concept: the plan model, label policy, YAML
//! documents, the retrying tracker decorator, the file-backed ledger and the
//! sync engine itself.

mod document_tests;
mod labels_tests;

use crate::sprint::domain::{PhaseStatus, SprintPhase, SprintTask, TaskModel};

/// Single-phase plan with one high-priority task.
fn healthcheck_plan(status: PhaseStatus) -> TaskModel {
    TaskModel::new("payments-hardening").with_phase(
        SprintPhase::new("Infra", status).with_task(
            SprintTask::new("Add healthcheck")
                .with_description("Expose /healthz")
                .with_labels(["priority:high"]),
        ),
    )
}
