//! Named steps that orchestrate resource changes.
//!
//! Commands are built from an ordered list of [`Task`]s. Each task records its
//! own feature events in the [`RunReport`]; [`execute`] decides whether a
//! failure aborts the command or only downgrades the step to a warning.
pub mod configs;
pub mod git_identity;
pub mod packages;
pub mod plugins;
pub mod ssh_key;
pub mod uninstall;

mod context;

pub use context::Context;

use anyhow::Result;

use crate::error::{BootstrapError, ConfigError, ReconcileError, ValidationError};
use crate::report::{Change, Feature, RunReport};

/// Result of running a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// The task did its work.
    Ok,
    /// The task had nothing to do.
    Skipped(String),
    /// The user declined a prompt.
    Cancelled,
}

/// Final status of an executed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Completed.
    Ok,
    /// Not applicable, or nothing to do.
    Skipped,
    /// The user declined.
    Cancelled,
    /// A non-critical failure, reported as a warning.
    Failed,
}

/// A named, executable task.
pub trait Task {
    /// Human-readable task name.
    fn name(&self) -> &'static str;

    /// Report feature the task's failures are recorded under.
    fn feature(&self) -> Feature;

    /// Whether a failure aborts the whole command.
    fn critical(&self) -> bool {
        false
    }

    /// Whether this task applies to this run.
    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task fails.
    fn run(&self, ctx: &Context, report: &mut RunReport) -> Result<TaskResult>;
}

/// Configuration and validation problems are never downgraded to warnings,
/// and neither is a deployment that reported success but left the
/// destination unlinked.
fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain().any(|e| {
        e.is::<ConfigError>()
            || e.is::<ValidationError>()
            || e.is::<BootstrapError>()
            || e.downcast_ref::<ReconcileError>()
                .is_some_and(|r| matches!(r, ReconcileError::Verification { .. }))
    })
}

/// Execute a task, logging its progress.
///
/// # Errors
///
/// Returns the task's error if the task is critical or the error is a
/// configuration or validation error. Other failures are logged, recorded as
/// [`Change::Failed`] and reported as [`TaskStatus::Failed`].
pub fn execute(task: &dyn Task, ctx: &Context, report: &mut RunReport) -> Result<TaskStatus> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        return Ok(TaskStatus::Skipped);
    }

    ctx.log.stage(task.name());

    match task.run(ctx, report) {
        Ok(TaskResult::Ok) => Ok(TaskStatus::Ok),
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.skip(&reason);
            Ok(TaskStatus::Skipped)
        }
        Ok(TaskResult::Cancelled) => {
            ctx.log.skip("cancelled");
            Ok(TaskStatus::Cancelled)
        }
        Err(e) if task.critical() || is_fatal(&e) => Err(e.context(task.name())),
        Err(e) => {
            ctx.log.warn(&format!("{}: {e:#}", task.name()));
            report.feature(task.feature(), Change::Failed, Some(&format!("{e:#}")));
            Ok(TaskStatus::Failed)
        }
    }
}

/// The complete set of tasks run by the install command, in order.
#[must_use]
pub fn all_install_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(packages::InstallCorePackages),
        Box::new(packages::InstallOptionalPackages),
        Box::new(configs::DeployConfigs),
        Box::new(configs::DeployTheme),
        Box::new(plugins::InstallPluginManagers),
        Box::new(git_identity::ConfigureGitIdentity::when_available()),
        Box::new(ssh_key::GenerateSshKey::when_available()),
    ]
}

/// The complete set of tasks run by the uninstall command.
#[must_use]
pub fn all_uninstall_tasks() -> Vec<Box<dyn Task>> {
    vec![Box::new(uninstall::RemoveLinks)]
}

/// Shared helpers for task unit tests.
///
/// [`Fixture`] owns a temporary repository and home directory plus every
/// collaborator a [`Context`] borrows.
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub mod test_helpers {
    use std::path::PathBuf;

    use super::Context;
    use crate::config::settings::{Settings, TargetEntry};
    use crate::config::targets::TargetRegistry;
    use crate::config::test_helpers::run_config;
    use crate::config::{Mode, RunConfig};
    use crate::logging::Logger;
    use crate::platform::{Os, Platform};
    use crate::prompt::test_helpers::{Reply, ScriptedPrompter};
    use crate::resources::backup::BackupStore;
    use crate::resources::symlink::SymlinkDeployer;
    use crate::resources::test_helpers::MockExecutor;

    /// Git template used by every fixture.
    pub const TEMPLATE: &str = "[user]\n\tname = __GIT_USER_NAME__\n\temail = __GIT_USER_EMAIL__\n";

    /// Owned collaborators for a task [`Context`].
    ///
    /// The repository holds `zsh/.zshrc` (linked directly to `~/.zshrc`) and
    /// the git template. No plugin managers are configured.
    #[derive(Debug)]
    pub struct Fixture {
        _dir: tempfile::TempDir,
        /// Repository root.
        pub root: PathBuf,
        /// Home directory.
        pub home: PathBuf,
        /// Run configuration.
        pub run: RunConfig,
        /// Settings.
        pub settings: Settings,
        /// Target registry derived from `settings`.
        pub registry: TargetRegistry,
        /// Logger.
        pub log: Logger,
        /// Executor.
        pub executor: MockExecutor,
        /// Prompter.
        pub prompter: ScriptedPrompter,
        /// Backup store under `home`.
        pub store: BackupStore,
    }

    impl Fixture {
        /// A fixture in `mode` with no scripted replies or executor responses.
        #[must_use]
        pub fn new(mode: Mode) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().join("dots");
            let home = dir.path().join("home");
            std::fs::create_dir_all(root.join("zsh")).unwrap();
            std::fs::create_dir_all(root.join("git")).unwrap();
            std::fs::create_dir_all(&home).unwrap();
            std::fs::write(root.join("zsh/.zshrc"), "# managed\n").unwrap();
            std::fs::write(root.join("git/.gitconfig.template"), TEMPLATE).unwrap();

            let settings = Settings {
                targets: vec![TargetEntry::Link {
                    source: "zsh/.zshrc".to_string(),
                    destination: ".zshrc".to_string(),
                }],
                plugins: vec![],
                ..Settings::default()
            };
            let registry = settings.registry(&root, &home);
            let store = BackupStore::new(settings.backup_root(&home), home.clone());
            let mut run = run_config(mode);
            run.root.clone_from(&root);
            run.home.clone_from(&home);

            Self {
                _dir: dir,
                root,
                home,
                run,
                settings,
                registry,
                log: Logger::default(),
                executor: MockExecutor::default(),
                prompter: ScriptedPrompter::default(),
                store,
            }
        }

        /// Replace the scripted prompter replies.
        #[must_use]
        pub fn with_replies(mut self, replies: Vec<Reply>) -> Self {
            self.prompter = ScriptedPrompter::new(replies);
            self
        }

        /// Replace the executor.
        #[must_use]
        pub fn with_executor(mut self, executor: MockExecutor) -> Self {
            self.executor = executor;
            self
        }

        /// Rebuild the registry after editing `settings`.
        pub fn refresh_registry(&mut self) {
            self.registry = self.settings.registry(&self.root, &self.home);
        }

        /// Borrow everything as a task context. Deploys with native symlinks.
        #[must_use]
        pub fn ctx(&self) -> Context<'_> {
            Context {
                run: &self.run,
                settings: &self.settings,
                registry: &self.registry,
                log: &self.log,
                executor: &self.executor,
                deployer: &SymlinkDeployer,
                prompter: &self.prompter,
                store: &self.store,
                platform: Platform::new(Os::Linux),
            }
        }
    }
}
