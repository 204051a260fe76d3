//! Label derivation and the non-destructive label diff.

use super::healthcheck_plan;
use crate::sprint::domain::{LabelDiff, LabelPolicy, PhaseStatus, TaskModel};
use rstest::rstest;
use std::collections::BTreeSet;

fn set(labels: &[&str]) -> BTreeSet<String> {
    labels.iter().map(|label| (*label).to_owned()).collect()
}

fn desired(model: &TaskModel, policy: &LabelPolicy) -> BTreeSet<String> {
    let (phase, task) = model.tasks().next().expect("plan should have a task");
    policy.desired_labels(model, phase, task)
}

#[rstest]
fn desired_labels_combine_task_and_phase() {
    let model = healthcheck_plan(PhaseStatus::Pending);
    assert_eq!(
        desired(&model, &LabelPolicy::default()),
        set(&["phase:Infra", "priority:high"])
    );
}

#[rstest]
fn blocked_phases_add_the_blocked_label() {
    let model = healthcheck_plan(PhaseStatus::Blocked);
    assert_eq!(
        desired(&model, &LabelPolicy::default()),
        set(&["blocked", "phase:Infra", "priority:high"])
    );
}

#[rstest]
fn sprint_and_default_labels_are_included() {
    let model = healthcheck_plan(PhaseStatus::Pending).with_labels(["sprint:payments"]);
    let policy = LabelPolicy::new("stage/", "on-hold").with_default_labels(["managed", " "]);
    assert_eq!(
        desired(&model, &policy),
        set(&["managed", "priority:high", "sprint:payments", "stage/Infra"])
    );
}

#[rstest]
fn foreign_labels_are_never_removed() {
    let model = healthcheck_plan(PhaseStatus::Pending);
    let policy = LabelPolicy::default();
    let vocabulary = policy.vocabulary(&model, &BTreeSet::new());

    let diff = LabelDiff::compute(
        &desired(&model, &policy),
        &set(&["needs-triage", "phase:Infra", "priority:high"]),
        &vocabulary,
    );
    assert!(diff.is_empty());
}

#[rstest]
fn stale_sprint_labels_are_removed() {
    let model = healthcheck_plan(PhaseStatus::Pending);
    let policy = LabelPolicy::default();
    let vocabulary = policy.vocabulary(&model, &set(&["phase:Design", "priority:low"]));

    let diff = LabelDiff::compute(
        &desired(&model, &policy),
        &set(&["blocked", "phase:Design", "priority:low", "team:core"]),
        &vocabulary,
    );
    assert_eq!(diff.to_add, set(&["phase:Infra", "priority:high"]));
    assert_eq!(diff.to_remove, set(&["blocked", "phase:Design", "priority:low"]));
}

#[rstest]
fn labels_unknown_to_previous_passes_are_kept() {
    let model = healthcheck_plan(PhaseStatus::Pending);
    let policy = LabelPolicy::default();
    let vocabulary = policy.vocabulary(&model, &BTreeSet::new());

    assert!(!vocabulary.contains("priority:low"));
    assert!(vocabulary.contains("priority:high"));
}

#[rstest]
#[case("phase:needs-design-review")]
#[case("phase:Renamed")]
fn phase_prefix_alone_does_not_confer_ownership(#[case] label: &str) {
    let model = healthcheck_plan(PhaseStatus::Pending);
    let policy = LabelPolicy::default();
    let vocabulary = policy.vocabulary(&model, &BTreeSet::new());

    assert!(!vocabulary.contains(label));
    let diff = LabelDiff::compute(
        &desired(&model, &policy),
        &set(&[label, "phase:Infra", "priority:high"]),
        &vocabulary,
    );
    assert!(diff.is_empty());
}

#[rstest]
fn carried_labels_are_released_once_settled() {
    let model = healthcheck_plan(PhaseStatus::Pending);
    let vocabulary =
        LabelPolicy::default().vocabulary(&model, &set(&["phase:Design", "priority:high"]));

    assert_eq!(vocabulary.carried(), &set(&["phase:Design"]));
    assert!(vocabulary.contains("phase:Design"));
    assert_eq!(
        vocabulary.remembered(false),
        set(&["blocked", "phase:Design", "phase:Infra", "priority:high"])
    );
    assert_eq!(
        vocabulary.remembered(true),
        set(&["blocked", "phase:Infra", "priority:high"])
    );
}
