//! Command: configure the git identity.
use anyhow::Result;

use super::{CommandOutcome, outcome_of, run_tasks_to_completion};
use crate::tasks::git_identity::ConfigureGitIdentity;
use crate::tasks::{Context, Task};

/// Run the git command: render and link the git identity.
///
/// # Errors
///
/// Returns an error if the template is missing, the identity is missing or
/// invalid in unattended mode, or the git group cannot be linked.
pub fn run(ctx: &Context) -> Result<CommandOutcome> {
    let task = ConfigureGitIdentity::required();
    let statuses = run_tasks_to_completion([&task as &dyn Task], ctx)?;
    Ok(outcome_of(&statuses))
}
