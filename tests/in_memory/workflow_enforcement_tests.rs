//! In-memory integration tests for workflow phase enforcement.

use super::helpers::{EnforcerHarness, enforcer_harness, outputs_for};
use eyre::ensure;
use rstest::rstest;
use shipwright::workflow::{
    domain::{EvidenceKind, EvidenceQuery, Phase, PhaseRuleError, SkipJustification, WorkItemId},
    services::WorkflowEnforcerError,
};

fn rule(
    result: Result<impl std::fmt::Debug, WorkflowEnforcerError>,
) -> eyre::Result<PhaseRuleError> {
    match result {
        Err(WorkflowEnforcerError::Rule(err)) => Ok(err),
        other => Err(eyre::eyre!("expected a rule violation, got {other:?}")),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn work_item_walks_every_phase(enforcer_harness: EnforcerHarness) -> eyre::Result<()> {
    let EnforcerHarness { evidence, enforcer } = enforcer_harness;
    for kind in [
        EvidenceKind::ArtifactExists,
        EvidenceKind::BranchHasCommits,
        EvidenceKind::TestsPassed,
        EvidenceKind::LintPassed,
        EvidenceKind::PublishedRefExists,
    ] {
        evidence.grant_kind(kind)?;
    }
    let id = WorkItemId::from(42);

    for phase in Phase::ALL {
        ensure!(enforcer.current_phase(&id).await? == phase);
        enforcer.start_phase(&id, phase).await?;
        enforcer.complete_phase(&id, phase, outputs_for(phase)).await?;
    }

    let state = enforcer
        .state(&id)
        .await?
        .ok_or_else(|| eyre::eyre!("workflow should be recorded"))?;
    ensure!(state.is_finished());
    ensure!(state.phase_history().len() == Phase::ALL.len());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unconfirmed_branch_blocks_implementation(
    enforcer_harness: EnforcerHarness,
) -> eyre::Result<()> {
    let EnforcerHarness { evidence, enforcer } = enforcer_harness;
    evidence.grant_kind(EvidenceKind::ArtifactExists)?;
    let id = WorkItemId::from(43);
    for phase in [Phase::Investigation, Phase::Planning] {
        enforcer.start_phase(&id, phase).await?;
        enforcer.complete_phase(&id, phase, outputs_for(phase)).await?;
    }
    enforcer.start_phase(&id, Phase::Implementation).await?;

    let refused = rule(
        enforcer
            .complete_phase(&id, Phase::Implementation, outputs_for(Phase::Implementation))
            .await,
    )?;
    ensure!(
        matches!(
            &refused,
            PhaseRuleError::OutputValidation { output, .. }
                if output == "implementation.branch.has_commits"
        ),
        "unexpected refusal {refused}"
    );

    evidence.grant(EvidenceQuery::about(
        EvidenceKind::BranchHasCommits,
        "feat/healthcheck",
    ))?;
    let state = enforcer
        .complete_phase(&id, Phase::Implementation, outputs_for(Phase::Implementation))
        .await?;
    ensure!(state.current_phase() == Phase::Validation);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mandatory_phases_cannot_be_skipped(enforcer_harness: EnforcerHarness) -> eyre::Result<()> {
    let id = WorkItemId::from(44);
    enforcer_harness
        .enforcer
        .skip_phase(&id, Phase::Investigation, SkipJustification::new("clear"))
        .await?;

    let refused = rule(
        enforcer_harness
            .enforcer
            .skip_phase(&id, Phase::Planning, SkipJustification::new("clear"))
            .await,
    )?;
    ensure!(matches!(refused, PhaseRuleError::SkipNotAllowed { phase: Phase::Planning, .. }));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn work_items_are_isolated(enforcer_harness: EnforcerHarness) -> eyre::Result<()> {
    let first = WorkItemId::from(1);
    let second = WorkItemId::from(2);
    enforcer_harness
        .enforcer
        .skip_phase(&first, Phase::Investigation, SkipJustification::new("clear"))
        .await?;

    ensure!(enforcer_harness.enforcer.current_phase(&first).await? == Phase::Planning);
    ensure!(enforcer_harness.enforcer.current_phase(&second).await? == Phase::Investigation);
    Ok(())
}
