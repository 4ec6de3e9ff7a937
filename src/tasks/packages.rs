//! Tasks: install core and optional packages.
use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};
use crate::report::{Change, Feature, RunReport};
use crate::resources::ResourceChange;
use crate::resources::package::{self, PackageManager};

fn detect(ctx: &Context) -> Result<PackageManager> {
    let manager = ctx.platform.package_manager(ctx.executor)?;
    ctx.log.debug(&format!("package manager: {manager}"));
    Ok(manager)
}

/// Install the core package list in one batch.
#[derive(Debug)]
pub struct InstallCorePackages;

impl Task for InstallCorePackages {
    fn name(&self) -> &'static str {
        "Install core packages"
    }

    fn feature(&self) -> Feature {
        Feature::Packages
    }

    fn critical(&self) -> bool {
        true
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.packages.core.is_empty()
    }

    fn run(&self, ctx: &Context, report: &mut RunReport) -> Result<TaskResult> {
        let manager = detect(ctx)?;
        let installed = package::installed_packages(manager, ctx.executor)?;
        let missing = package::missing(&ctx.settings.packages.core, &installed);
        if missing.is_empty() {
            report.feature(Feature::Packages, Change::Skipped, Some("core"));
            return Ok(TaskResult::Skipped(
                "core packages already installed".to_string(),
            ));
        }

        let names = missing.join(" ");
        ctx.log.info(&format!("installing {names}"));
        let change = package::install(manager, ctx.executor, &missing)
            .with_context(|| format!("installing {names}"))?;
        ctx.log.success(&format!("installed {names}"));
        report.feature(Feature::Packages, Change::from(&change), Some(&names));
        Ok(TaskResult::Ok)
    }
}

/// Install optional packages one at a time; each failure is only a warning.
#[derive(Debug)]
pub struct InstallOptionalPackages;

impl Task for InstallOptionalPackages {
    fn name(&self) -> &'static str {
        "Install optional packages"
    }

    fn feature(&self) -> Feature {
        Feature::Packages
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.packages.optional.is_empty()
    }

    fn run(&self, ctx: &Context, report: &mut RunReport) -> Result<TaskResult> {
        let manager = detect(ctx)?;
        let installed = package::installed_packages(manager, ctx.executor)?;
        let missing = package::missing(&ctx.settings.packages.optional, &installed);
        if missing.is_empty() {
            report.feature(Feature::Packages, Change::Skipped, Some("optional"));
            return Ok(TaskResult::Skipped(
                "optional packages already installed".to_string(),
            ));
        }

        for name in missing {
            match package::install(manager, ctx.executor, &[name]) {
                Ok(change) => {
                    if change != ResourceChange::AlreadyCorrect {
                        ctx.log.success(&format!("installed {name}"));
                    }
                    report.feature(Feature::Packages, Change::from(&change), Some(name));
                }
                Err(e) => {
                    ctx.log.warn(&format!("{name}: {e:#}"));
                    report.feature(Feature::Packages, Change::Failed, Some(name));
                }
            }
        }
        Ok(TaskResult::Ok)
    }
}
