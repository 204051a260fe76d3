//! Then steps for sprint synchronisation BDD scenarios.

use super::world::SyncWorld;
use rstest_bdd_macros::then;
use shipwright::sprint::domain::{IssueRecord, IssueState, SyncAction, TrackerId};
use std::collections::BTreeSet;

fn issue(world: &SyncWorld, number: u64) -> Result<IssueRecord, eyre::Report> {
    world
        .tracker
        .issue(&TrackerId::from(number))
        .ok_or_else(|| eyre::eyre!("issue #{number} does not exist"))
}

#[then(r#"issue #{number:u64} is "{state}""#)]
fn issue_is_in_state(world: &SyncWorld, number: u64, state: String) -> Result<(), eyre::Report> {
    let expected = match state.as_str() {
        "open" => IssueState::Open,
        "closed" => IssueState::Closed,
        other => return Err(eyre::eyre!("unknown issue state in scenario: {other}")),
    };
    let found = issue(world, number)?.state;
    eyre::ensure!(found == expected, "expected issue #{number} {expected}, found {found}");
    Ok(())
}

#[then(r#"issue #{number:u64} has labels "{labels}""#)]
fn issue_has_labels(world: &SyncWorld, number: u64, labels: String) -> Result<(), eyre::Report> {
    let expected: BTreeSet<String> = labels
        .split(',')
        .map(|label| label.trim().to_owned())
        .collect();
    let found = issue(world, number)?.labels;
    eyre::ensure!(found == expected, "expected labels {expected:?}, found {found:?}");
    Ok(())
}

#[then(r#"the task "{title}" is linked to issue #{number:u64}"#)]
fn task_is_linked(world: &SyncWorld, title: String, number: u64) -> Result<(), eyre::Report> {
    let report = world.last_report()?;
    let linked = report
        .model
        .tasks()
        .find(|(_, task)| task.title() == title)
        .and_then(|(_, task)| task.tracker_id().cloned());
    eyre::ensure!(
        linked == Some(TrackerId::from(number)),
        "expected '{title}' linked to #{number}, found {linked:?}"
    );
    Ok(())
}

#[then("the pass closed orphaned issue #{number:u64} without a comment")]
fn orphan_closed_quietly(world: &SyncWorld, number: u64) -> Result<(), eyre::Report> {
    let report = world.last_report()?;
    let expected_id = TrackerId::from(number);
    let matched = report.actions.iter().any(|action| {
        matches!(
            action,
            SyncAction::OrphanClosed {
                tracker_id,
                was_open: false,
                commented: false,
                ..
            } if *tracker_id == expected_id
        )
    });
    eyre::ensure!(matched, "unexpected actions {:?}", report.actions);
    eyre::ensure!(world.tracker.comments(&expected_id).is_empty());
    Ok(())
}

#[then("the pass reports no actions")]
fn pass_reports_nothing(world: &SyncWorld) -> Result<(), eyre::Report> {
    let report = world.last_report()?;
    eyre::ensure!(report.is_noop(), "unexpected actions {:?}", report.actions);
    Ok(())
}
