//! Then steps for workflow phase BDD scenarios.

use super::world::{WorkflowWorld, phase, run_async};
use rstest_bdd_macros::then;
use shipwright::workflow::domain::PhaseRuleError;

#[then(r#"the current phase is "{name}""#)]
fn current_phase_is(world: &WorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let expected = phase(&name)?;
    let found = run_async(world.enforcer.current_phase(&world.work_item_id))?;
    eyre::ensure!(found == expected, "expected phase {expected}, found {found}");
    Ok(())
}

#[then(r#"the request is refused because "{condition}" is not met"#)]
fn refused_with_prerequisite(world: &WorkflowWorld, condition: String) -> Result<(), eyre::Report> {
    let error = world.last_error()?;
    match error.as_rule() {
        Some(PhaseRuleError::Prerequisite {
            condition: found, ..
        }) if *found == condition => Ok(()),
        _ => Err(eyre::eyre!("expected unmet '{condition}', got {error}")),
    }
}

#[then(r#"the request is refused because output "{output}" is invalid"#)]
fn refused_with_invalid_output(world: &WorkflowWorld, output: String) -> Result<(), eyre::Report> {
    let error = world.last_error()?;
    match error.as_rule() {
        Some(PhaseRuleError::OutputValidation { output: found, .. }) if *found == output => Ok(()),
        _ => Err(eyre::eyre!("expected invalid output '{output}', got {error}")),
    }
}

#[then("the skip is refused")]
fn skip_refused(world: &WorkflowWorld) -> Result<(), eyre::Report> {
    let error = world.last_error()?;
    eyre::ensure!(
        matches!(error.as_rule(), Some(PhaseRuleError::SkipNotAllowed { .. })),
        "expected a refused skip, got {error}"
    );
    Ok(())
}
