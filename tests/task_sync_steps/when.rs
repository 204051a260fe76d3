//! When steps for sprint synchronisation BDD scenarios.

use super::world::{SyncWorld, run_async};
use rstest_bdd_macros::when;
use shipwright::sprint::domain::PhaseStatus;

#[when(r#"the phase status becomes "{status}""#)]
fn phase_status_becomes(world: &mut SyncWorld, status: String) -> Result<(), eyre::Report> {
    world.phase_status = PhaseStatus::try_from(status.as_str())?;
    Ok(())
}

#[when(r#"the task "{title}" is removed from the plan"#)]
fn task_removed(world: &mut SyncWorld, title: String) {
    world.tasks.retain(|task| task.title() != title);
}

#[when("the sprint is synced")]
fn sprint_is_synced(world: &mut SyncWorld) {
    let plan = world.plan();
    world.last_result = Some(run_async(world.engine.sync(plan)));
}
