//! When steps for workflow phase BDD scenarios.

use super::world::{WorkflowWorld, phase, run_async};
use rstest_bdd_macros::when;
use shipwright::workflow::domain::{PhaseOutputs, SkipJustification};

#[when(r#"phase "{name}" is started"#)]
fn phase_started(world: &mut WorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let requested = phase(&name)?;
    world.last_result = Some(run_async(
        world.enforcer.start_phase(&world.work_item_id, requested),
    ));
    Ok(())
}

#[when(r#"phase "{name}" is skipped with scope clarity "{clarity}""#)]
fn phase_skipped(
    world: &mut WorkflowWorld,
    name: String,
    clarity: String,
) -> Result<(), eyre::Report> {
    let skipped = phase(&name)?;
    let justification = SkipJustification::new(clarity).with_reason("fix is a one-line change");
    world.last_result = Some(run_async(world.enforcer.skip_phase(
        &world.work_item_id,
        skipped,
        justification,
    )));
    Ok(())
}

#[when(r#"the planning phase is completed with plan "{plan}""#)]
fn planning_completed(world: &mut WorkflowWorld, plan: String) -> Result<(), eyre::Report> {
    let planning = phase("planning")?;
    let outputs = PhaseOutputs::new()
        .with("task_breakdown", plan.as_str())
        .with("execution_plan", plan.as_str());
    world.last_result = Some(run_async(world.enforcer.complete_phase(
        &world.work_item_id,
        planning,
        outputs,
    )));
    Ok(())
}
