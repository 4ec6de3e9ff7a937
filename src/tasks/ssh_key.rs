//! Task: generate an SSH key pair.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::config::identity::{resolve_passphrase, resolve_ssh_email};
use crate::prompt::Answer;
use crate::report::{Change, Event, Feature, RunReport};
use crate::resources::backup::BackupMode;
use crate::resources::ssh_key::KeyPair;

/// Generate an ed25519 key, register it with the agent and copy the public
/// half to the clipboard.
///
/// An existing key is only replaced after an explicit interactive yes; both
/// halves are moved into the backup directory first.
#[derive(Debug)]
pub struct GenerateSshKey {
    required: bool,
}

impl GenerateSshKey {
    /// Always run; a missing email fails in unattended mode.
    #[must_use]
    pub const fn required() -> Self {
        Self { required: true }
    }

    /// Run when a prompt is possible or an email was supplied.
    #[must_use]
    pub const fn when_available() -> Self {
        Self { required: false }
    }
}

impl Task for GenerateSshKey {
    fn name(&self) -> &'static str {
        "Generate SSH key"
    }

    fn feature(&self) -> Feature {
        Feature::SshKey
    }

    fn critical(&self) -> bool {
        self.required
    }

    fn should_run(&self, ctx: &Context) -> bool {
        self.required || ctx.run.is_interactive() || ctx.run.identity.has_ssh_email()
    }

    fn run(&self, ctx: &Context, report: &mut RunReport) -> Result<TaskResult> {
        let keys = KeyPair::in_home(&ctx.run.home);
        let replacing = keys.exists();
        if replacing {
            if !ctx.run.is_interactive() || ctx.run.skip_confirmation {
                report.feature(Feature::SshKey, Change::Skipped, Some("existing key kept"));
                return Ok(TaskResult::Skipped(format!(
                    "{} already exists",
                    keys.private.display()
                )));
            }
            let question = format!(
                "{} already exists. Back it up and generate a new key?",
                keys.private.display()
            );
            match ctx.prompter.confirm(&question, false)? {
                Answer::Given(true) => {}
                Answer::Given(false) => {
                    report.feature(Feature::SshKey, Change::Skipped, Some("existing key kept"));
                    return Ok(TaskResult::Skipped("existing key kept".to_string()));
                }
                Answer::Cancelled => {
                    report.feature(Feature::SshKey, Change::Cancelled, None);
                    return Ok(TaskResult::Cancelled);
                }
            }
        }

        let Answer::Given(email) = resolve_ssh_email(ctx.run, ctx.prompter, ctx.log)? else {
            report.feature(Feature::SshKey, Change::Cancelled, None);
            return Ok(TaskResult::Cancelled);
        };
        let Answer::Given(passphrase) = resolve_passphrase(ctx.run, ctx.prompter)? else {
            report.feature(Feature::SshKey, Change::Cancelled, None);
            return Ok(TaskResult::Cancelled);
        };

        if replacing {
            for half in [&keys.private, &keys.public] {
                if half.symlink_metadata().is_err() {
                    continue;
                }
                let record = ctx.store.backup(half, BackupMode::Move)?;
                ctx.log.info(&format!(
                    "backed up {} -> {}",
                    record.original_path.display(),
                    record.backup_path.display()
                ));
                report.record(Event::Backup(record));
            }
        }

        keys.generate(ctx.executor, &email, &passphrase)?;
        ctx.log
            .success(&format!("generated {}", keys.private.display()));

        if ctx.run.agent_available {
            match keys.add_to_agent(ctx.executor) {
                Ok(()) => ctx.log.success("added key to ssh-agent"),
                Err(e) => ctx.log.warn(&format!("ssh-add: {e:#}")),
            }
        } else {
            ctx.log.debug("no ssh-agent reachable");
        }

        match keys.copy_public_key(ctx.executor) {
            Ok(Some(tool)) => ctx.log.success(&format!("public key copied with {tool}")),
            Ok(None) => ctx.log.info(&format!(
                "no clipboard tool found; public key is in {}",
                keys.public.display()
            )),
            Err(e) => ctx.log.warn(&format!("clipboard: {e:#}")),
        }

        let change = if replacing {
            Change::Updated
        } else {
            Change::Fresh
        };
        report.feature(Feature::SshKey, change, Some(&email));
        Ok(TaskResult::Ok)
    }
}
