//! Top-level subcommand orchestration.
pub mod git;
pub mod install;
pub mod link;
pub mod ssh;
pub mod uninstall;
pub mod version;

use anyhow::Result;

use crate::config::RunConfig;
use crate::config::settings::Settings;
use crate::config::targets::TargetRegistry;
use crate::exec::Executor;
use crate::logging::Logger;
use crate::platform::Platform;
use crate::prompt::Prompter;
use crate::report::RunReport;
use crate::resources::backup::BackupStore;
use crate::resources::deploy::Deployer;
use crate::tasks::{self, Context, Task, TaskStatus};

/// How a command finished, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Everything requested was done or already in place.
    Completed,
    /// The user declined a prompt; exits with the cancellation status.
    Cancelled,
}

/// Shared state produced by the common command setup sequence.
///
/// Loads `bootstrap.toml`, resolves targets against the root and home
/// directories and prepares the backup store, so that each command does not
/// have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Parsed settings, or their defaults.
    pub settings: Settings,
    /// Managed targets.
    pub registry: TargetRegistry,
    /// Backup directory.
    pub store: BackupStore,
    /// Detected platform.
    pub platform: Platform,
}

impl CommandSetup {
    /// Load settings and resolve every managed target.
    ///
    /// Sources are not checked here; commands that deploy call
    /// [`TargetRegistry::validate`] before touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if `bootstrap.toml` exists but cannot be read or
    /// parsed.
    pub fn init(run: &RunConfig, log: &Logger) -> Result<Self> {
        log.debug(&format!("root: {}", run.root.display()));
        log.debug(&format!("home: {}", run.home.display()));

        let settings = Settings::load(&run.root)?;
        let registry = settings.registry(&run.root, &run.home);
        let store = BackupStore::new(settings.backup_root(&run.home), run.home.clone());

        log.debug(&format!("{} config targets", registry.configs.len()));
        log.debug(&format!(
            "{} core / {} optional packages",
            settings.packages.core.len(),
            settings.packages.optional.len()
        ));
        log.debug(&format!("{} plugin managers", settings.plugins.len()));
        log.debug(&format!("backups: {}", store.root().display()));

        Ok(Self {
            settings,
            registry,
            store,
            platform: Platform::detect(),
        })
    }

    /// Borrow the setup and the run's collaborators as a task context.
    #[must_use]
    pub const fn context<'a>(
        &'a self,
        run: &'a RunConfig,
        log: &'a Logger,
        executor: &'a dyn Executor,
        deployer: &'a dyn Deployer,
        prompter: &'a dyn Prompter,
    ) -> Context<'a> {
        Context {
            run,
            settings: &self.settings,
            registry: &self.registry,
            log,
            executor,
            deployer,
            prompter,
            store: &self.store,
            platform: self.platform,
        }
    }
}

/// Execute every task in order and print the run report.
///
/// The report is printed even when a task aborts the run, so backups taken
/// before the failure are always listed.
///
/// # Errors
///
/// Returns the first critical or fatal task error.
pub fn run_tasks_to_completion<'a>(
    tasks: impl IntoIterator<Item = &'a dyn Task>,
    ctx: &Context,
) -> Result<Vec<TaskStatus>> {
    let mut report = RunReport::new();
    let mut statuses = Vec::new();
    let mut failure = None;

    for task in tasks {
        match tasks::execute(task, ctx, &mut report) {
            Ok(status) => statuses.push(status),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    print_report(&report, ctx.log);

    match failure {
        Some(e) => Err(e),
        None => Ok(statuses),
    }
}

fn print_report(report: &RunReport, log: &Logger) {
    log.stage("Summary");
    for line in report.render().lines() {
        log.info(line);
    }
    log.print_log_location();
}

/// A single-purpose command is cancelled if any of its steps was.
fn outcome_of(statuses: &[TaskStatus]) -> CommandOutcome {
    if statuses.contains(&TaskStatus::Cancelled) {
        CommandOutcome::Cancelled
    } else {
        CommandOutcome::Completed
    }
}
