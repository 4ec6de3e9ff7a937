//! Command: generate an SSH key.
use anyhow::Result;

use super::{CommandOutcome, outcome_of, run_tasks_to_completion};
use crate::tasks::ssh_key::GenerateSshKey;
use crate::tasks::{Context, Task};

/// Run the ssh command: generate a key pair.
///
/// # Errors
///
/// Returns an error if the email is missing or invalid in unattended mode or
/// key generation fails.
pub fn run(ctx: &Context) -> Result<CommandOutcome> {
    let task = GenerateSshKey::required();
    let statuses = run_tasks_to_completion([&task as &dyn Task], ctx)?;
    Ok(outcome_of(&statuses))
}
