//! Command: link configuration files only.
use anyhow::Result;

use super::{CommandOutcome, outcome_of, run_tasks_to_completion};
use crate::tasks::configs::{DeployConfigs, DeployTheme};
use crate::tasks::{Context, Task};

/// Run the link command: deploy configuration targets and the theme only.
///
/// # Errors
///
/// Returns an error if a configured source is missing or a target cannot be
/// reconciled.
pub fn run(ctx: &Context) -> Result<CommandOutcome> {
    ctx.registry.validate()?;
    let tasks: [&dyn Task; 2] = [&DeployConfigs, &DeployTheme];
    let statuses = run_tasks_to_completion(tasks, ctx)?;
    Ok(outcome_of(&statuses))
}
