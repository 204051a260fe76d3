//! Given steps for workflow phase BDD scenarios.

use super::world::{WorkflowWorld, phase, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use shipwright::workflow::domain::{EvidenceKind, PhaseOutputs, WorkItemId};

#[given("work item {id:u64} with no recorded workflow")]
fn fresh_work_item(world: &mut WorkflowWorld, id: u64) {
    world.work_item_id = WorkItemId::from(id);
}

#[given("artifact evidence is available")]
fn artifacts_available(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    world.evidence.grant_kind(EvidenceKind::ArtifactExists)?;
    Ok(())
}

#[given(r#"phase "{name}" was completed with findings "{findings}""#)]
fn phase_completed(
    world: &mut WorkflowWorld,
    name: String,
    findings: String,
) -> Result<(), eyre::Report> {
    let completed = phase(&name)?;
    run_async(world.enforcer.start_phase(&world.work_item_id, completed))
        .wrap_err("start phase in scenario setup")?;
    run_async(world.enforcer.complete_phase(
        &world.work_item_id,
        completed,
        PhaseOutputs::new().with("findings", findings),
    ))
    .wrap_err("complete phase in scenario setup")?;
    Ok(())
}
