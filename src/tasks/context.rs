//! Shared borrowed state passed to every task.
use crate::config::RunConfig;
use crate::config::settings::Settings;
use crate::config::targets::TargetRegistry;
use crate::exec::Executor;
use crate::logging::Logger;
use crate::platform::Platform;
use crate::prompt::Prompter;
use crate::reconcile::Reconciler;
use crate::resources::backup::BackupStore;
use crate::resources::deploy::Deployer;

/// Shared context for task execution.
///
/// Everything is borrowed: the command builds the pieces once and every task
/// reads them through this struct.
pub struct Context<'a> {
    /// Flags and environment for this invocation.
    pub run: &'a RunConfig,
    /// Parsed `bootstrap.toml`, or its defaults.
    pub settings: &'a Settings,
    /// Managed targets resolved against the root and home directories.
    pub registry: &'a TargetRegistry,
    /// Logger for output.
    pub log: &'a Logger,
    /// Command executor (for testing or real system calls).
    pub executor: &'a dyn Executor,
    /// Deploy mechanism used by the reconciler.
    pub deployer: &'a dyn Deployer,
    /// Source of answers for interactive questions.
    pub prompter: &'a dyn Prompter,
    /// Backup directory.
    pub store: &'a BackupStore,
    /// Detected platform information.
    pub platform: Platform,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("run", &self.run)
            .field("settings", &"<Settings>")
            .field("registry", &self.registry)
            .field("executor", &"<dyn Executor>")
            .field("deployer", &"<dyn Deployer>")
            .field("prompter", &"<dyn Prompter>")
            .field("store", &self.store)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl Context<'_> {
    /// A reconciler honouring this run's overwrite policy.
    #[must_use]
    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(
            self.run.overwrite_policy(),
            self.store,
            self.deployer,
            self.prompter,
            self.log,
        )
    }
}
