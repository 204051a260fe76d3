//! Given steps for sprint synchronisation BDD scenarios.

use super::world::{SyncWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use shipwright::sprint::domain::{PhaseStatus, SprintTask};

#[given(r#"a sprint "{sprint}" with phase "{phase}" in status "{status}""#)]
fn sprint_with_phase(
    world: &mut SyncWorld,
    sprint: String,
    phase: String,
    status: String,
) -> Result<(), eyre::Report> {
    world.sprint = sprint;
    world.phase_name = phase;
    world.phase_status = PhaseStatus::try_from(status.as_str())?;
    Ok(())
}

#[given(r#"the phase has task "{title}" labelled "{label}""#)]
fn phase_has_task(world: &mut SyncWorld, title: String, label: String) {
    world.tasks.push(SprintTask::new(title).with_labels([label]));
}

#[given("the tracker numbers new issues from {number:u64}")]
fn tracker_numbering(world: &mut SyncWorld, number: u64) {
    world.restart_numbering(number);
}

#[given("the sprint has been synced")]
fn sprint_synced(world: &mut SyncWorld) -> Result<(), eyre::Report> {
    let plan = world.plan();
    run_async(world.engine.sync(plan)).wrap_err("initial sync in scenario setup")?;
    Ok(())
}
