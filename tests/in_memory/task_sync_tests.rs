//! In-memory integration tests for sprint synchronisation.

use std::sync::Arc;

use super::helpers::{PAYMENTS_PLAN, SyncHarness, sync_harness};
use eyre::ensure;
use rstest::rstest;
use shipwright::sprint::{
    adapters::memory::{TrackerCall, TrackerCallKind},
    domain::{
        IssueState, PhaseStatus, SprintDocument, SprintPhase, SprintTask, TaskModel, TrackerId,
    },
    ports::TrackerError,
};

fn labels_of(harness: &SyncHarness, number: u64) -> Vec<String> {
    harness
        .tracker
        .issue(&TrackerId::from(number))
        .map(|issue| issue.labels.into_iter().collect())
        .unwrap_or_default()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn document_plan_round_trips_through_the_tracker(
    sync_harness: SyncHarness,
) -> eyre::Result<()> {
    let plan = SprintDocument::from_yaml_str(PAYMENTS_PLAN)?;

    let report = sync_harness.engine.sync(plan).await?;

    ensure!(!report.has_failures(), "failures {:?}", report.actions);
    ensure!(sync_harness.tracker.issues().len() == 3);
    ensure!(
        labels_of(&sync_harness, 50)
            == vec!["phase:Infra", "priority:high", "sprint:payments"]
    );
    ensure!(labels_of(&sync_harness, 52) == vec!["phase:Rollout", "sprint:payments"]);
    let alerts_body = sync_harness
        .tracker
        .issue(&TrackerId::from(51))
        .map(|issue| issue.body)
        .unwrap_or_default();
    ensure!(alerts_body.ends_with("Depends on: Add healthcheck"), "body {alerts_body:?}");

    let rendered = SprintDocument::to_yaml_string(&report.model)?;
    let reloaded = SprintDocument::from_yaml_str(&rendered)?;
    ensure!(reloaded.linked_ids().len() == 3);

    sync_harness.tracker.clear_calls();
    let again = sync_harness.engine.sync(reloaded).await?;
    ensure!(again.is_noop(), "unexpected actions {:?}", again.actions);
    ensure!(sync_harness.tracker.mutations().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transient_tracker_failures_are_absorbed(sync_harness: SyncHarness) -> eyre::Result<()> {
    sync_harness
        .tracker
        .fail_next(TrackerCallKind::CreateIssue, TrackerError::rate_limited(None));
    sync_harness
        .tracker
        .fail_next(TrackerCallKind::CreateIssue, TrackerError::timeout());

    let report = sync_harness
        .engine
        .sync(SprintDocument::from_yaml_str(PAYMENTS_PLAN)?)
        .await?;

    ensure!(!report.has_failures(), "failures {:?}", report.actions);
    let creates = sync_harness
        .tracker
        .calls()
        .iter()
        .filter(|call| matches!(call, TrackerCall::CreateIssue(_)))
        .count();
    ensure!(creates == 5, "expected two retried creations, saw {creates} calls");
    ensure!(sync_harness.tracker.issues().len() == 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn exhausted_retries_are_reported_and_recovered(
    sync_harness: SyncHarness,
) -> eyre::Result<()> {
    for _ in 0..3 {
        sync_harness
            .tracker
            .fail_next(TrackerCallKind::SetIssueState, TrackerError::timeout());
    }
    let first = sync_harness
        .engine
        .sync(SprintDocument::from_yaml_str(PAYMENTS_PLAN)?)
        .await?;
    let closing = TaskModel::new("payments-hardening").with_phase(
        SprintPhase::new("Infra", PhaseStatus::Completed).with_tasks(
            first
                .model
                .phases()
                .first()
                .map(|phase| phase.tasks().to_vec())
                .unwrap_or_default(),
        ),
    );

    let failed = sync_harness.engine.sync(closing.clone()).await?;
    ensure!(failed.failures().count() == 1, "actions {:?}", failed.actions);

    let recovered = sync_harness.engine.sync(closing).await?;
    ensure!(!recovered.has_failures());
    ensure!(
        sync_harness
            .tracker
            .issues()
            .iter()
            .filter(|issue| issue.state == IssueState::Closed)
            .count()
            == 3,
        "every Infra issue and the dropped Rollout issue should be closed"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sprints_do_not_touch_each_other(sync_harness: SyncHarness) -> eyre::Result<()> {
    let plan = |sprint: &str, titles: &[&str]| {
        TaskModel::new(sprint).with_phase(
            SprintPhase::new("Infra", PhaseStatus::Pending)
                .with_tasks(titles.iter().map(|title| SprintTask::new(*title))),
        )
    };
    let engine = Arc::new(sync_harness.engine);
    let alpha = {
        let task_engine = Arc::clone(&engine);
        let model = plan("alpha", &["Add healthcheck"]);
        tokio::spawn(async move { task_engine.sync(model).await })
    };
    let beta = {
        let task_engine = Arc::clone(&engine);
        let model = plan("beta", &["Add healthcheck"]);
        tokio::spawn(async move { task_engine.sync(model).await })
    };
    alpha.await??;
    beta.await??;
    ensure!(sync_harness.tracker.issues().len() == 2);

    let emptied = engine.sync(plan("alpha", &[])).await?;
    ensure!(emptied.actions.len() == 1, "actions {:?}", emptied.actions);
    let open = sync_harness
        .tracker
        .issues()
        .iter()
        .filter(|issue| issue.state == IssueState::Open)
        .count();
    ensure!(open == 1, "beta's issue should stay open");
    Ok(())
}
