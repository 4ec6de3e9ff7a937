//! Tasks: link configuration files and the terminal theme.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::config::targets::ManagedTarget;
use crate::reconcile::Outcome;
use crate::report::{Feature, RunReport};

/// Reconcile `targets` and summarise the outcomes as a task result.
fn deploy(
    ctx: &Context,
    targets: &[ManagedTarget],
    feature: Feature,
    report: &mut RunReport,
) -> Result<TaskResult> {
    let outcomes = ctx.reconciler().reconcile_all(targets, feature, report)?;
    if outcomes.iter().any(|o| *o == Outcome::Cancelled) {
        return Ok(TaskResult::Cancelled);
    }
    if outcomes.iter().all(|o| matches!(o, Outcome::Skipped(_))) {
        return Ok(TaskResult::Skipped("already linked".to_string()));
    }
    Ok(TaskResult::Ok)
}

/// Link every core configuration target.
#[derive(Debug)]
pub struct DeployConfigs;

impl Task for DeployConfigs {
    fn name(&self) -> &'static str {
        "Deploy configs"
    }

    fn feature(&self) -> Feature {
        Feature::Configs
    }

    fn critical(&self) -> bool {
        true
    }

    fn run(&self, ctx: &Context, report: &mut RunReport) -> Result<TaskResult> {
        deploy(ctx, &ctx.registry.configs, Feature::Configs, report)
    }
}

/// Link the terminal theme, when one is configured.
#[derive(Debug)]
pub struct DeployTheme;

impl Task for DeployTheme {
    fn name(&self) -> &'static str {
        "Deploy terminal theme"
    }

    fn feature(&self) -> Feature {
        Feature::TerminalTheme
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.registry.theme.is_some()
    }

    fn run(&self, ctx: &Context, report: &mut RunReport) -> Result<TaskResult> {
        match &ctx.registry.theme {
            Some(theme) => deploy(
                ctx,
                std::slice::from_ref(theme),
                Feature::TerminalTheme,
                report,
            ),
            None => Ok(TaskResult::Skipped("no theme configured".to_string())),
        }
    }
}
