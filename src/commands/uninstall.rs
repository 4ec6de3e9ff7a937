//! Uninstall command implementation.
use anyhow::Result;

use super::{CommandOutcome, run_tasks_to_completion};
use crate::tasks::{self, Context};

/// Run the uninstall command.
///
/// # Errors
///
/// Returns an error if a destination cannot be probed or unlinking fails.
pub fn run(ctx: &Context) -> Result<CommandOutcome> {
    let tasks = tasks::all_uninstall_tasks();
    run_tasks_to_completion(tasks.iter().map(Box::as_ref), ctx)?;
    Ok(CommandOutcome::Completed)
}
