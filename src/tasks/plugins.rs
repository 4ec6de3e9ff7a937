//! Task: install shell and editor plugin managers.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::report::{Change, Feature, RunReport};
use crate::resources::ResourceChange;
use crate::resources::plugin::PluginCheckout;

/// Clone or fast-forward the configured plugin managers.
///
/// Each manager is independent; a failing clone is recorded and the rest
/// still run.
#[derive(Debug)]
pub struct InstallPluginManagers;

impl Task for InstallPluginManagers {
    fn name(&self) -> &'static str {
        "Install plugin managers"
    }

    fn feature(&self) -> Feature {
        Feature::PluginManagers
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.plugins.is_empty() && ctx.executor.which("git")
    }

    fn run(&self, ctx: &Context, report: &mut RunReport) -> Result<TaskResult> {
        let mut changed = false;
        for manager in &ctx.settings.plugins {
            let checkout = PluginCheckout {
                name: &manager.name,
                repo: &manager.repo,
                path: ctx.run.home.join(&manager.path),
            };
            match checkout.apply(ctx.executor) {
                Ok(change) => {
                    match &change {
                        ResourceChange::Created => {
                            ctx.log.success(&format!("{}: installed", manager.name));
                        }
                        ResourceChange::Updated => {
                            ctx.log.success(&format!("{}: updated", manager.name));
                        }
                        ResourceChange::AlreadyCorrect => {
                            ctx.log.skip(&format!("{}: up to date", manager.name));
                        }
                        ResourceChange::Skipped { reason } => {
                            ctx.log.warn(&format!("{}: {reason}", manager.name));
                        }
                    }
                    changed |=
                        matches!(change, ResourceChange::Created | ResourceChange::Updated);
                    report.feature(
                        Feature::PluginManagers,
                        Change::from(&change),
                        Some(&manager.name),
                    );
                }
                Err(e) => {
                    ctx.log.warn(&format!("{}: {e:#}", manager.name));
                    report.feature(
                        Feature::PluginManagers,
                        Change::Failed,
                        Some(&manager.name),
                    );
                }
            }
        }
        if changed {
            Ok(TaskResult::Ok)
        } else {
            Ok(TaskResult::Skipped("plugin managers unchanged".to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::config::settings::PluginManager;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::Fixture;

    fn with_plugins(exec: MockExecutor) -> Fixture {
        let mut fx = Fixture::new(Mode::Unattended).with_executor(exec.with_which(true));
        fx.settings.plugins = vec![
            PluginManager {
                name: "tpm".to_string(),
                repo: "https://example.com/tpm".to_string(),
                path: ".tmux/plugins/tpm".to_string(),
            },
            PluginManager {
                name: "zinit".to_string(),
                repo: "https://example.com/zinit".to_string(),
                path: ".local/share/zinit/zinit.git".to_string(),
            },
        ];
        fx
    }

    #[test]
    fn skipped_without_git() {
        let mut fx = with_plugins(MockExecutor::default());
        fx.executor = MockExecutor::default();
        assert!(!InstallPluginManagers.should_run(&fx.ctx()));
    }

    #[test]
    fn fresh_clones_are_recorded() {
        let fx = with_plugins(MockExecutor::default());
        let mut report = RunReport::new();
        let result = InstallPluginManagers.run(&fx.ctx(), &mut report).unwrap();
        assert_eq!(result, TaskResult::Ok);
        let calls = fx.executor.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("https://example.com/tpm"));
        assert!(report.has(Feature::PluginManagers, Change::Fresh));
    }

    #[test]
    fn one_failure_does_not_stop_the_other() {
        let fx = with_plugins(MockExecutor::with_responses(vec![(false, String::new())]));
        let mut report = RunReport::new();
        InstallPluginManagers.run(&fx.ctx(), &mut report).unwrap();
        assert_eq!(fx.executor.call_count(), 2);
        assert!(report.has(Feature::PluginManagers, Change::Failed));
        assert!(report.has(Feature::PluginManagers, Change::Fresh));
    }
}
