//! Task: remove links owned by the dotfiles checkout.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::config::targets::ManagedTarget;
use crate::reconcile::{unit_label, units};
use crate::report::{Change, Feature, RunReport};
use crate::resources::destination::{DestinationState, probe};

/// Remove every link this repository owns.
///
/// A unit is undeployed only when at least one member is a managed link, so
/// foreign files and links stay where they are. Backups are not restored.
#[derive(Debug)]
pub struct RemoveLinks;

impl Task for RemoveLinks {
    fn name(&self) -> &'static str {
        "Remove links"
    }

    fn feature(&self) -> Feature {
        Feature::Configs
    }

    fn critical(&self) -> bool {
        true
    }

    fn run(&self, ctx: &Context, report: &mut RunReport) -> Result<TaskResult> {
        let targets: Vec<ManagedTarget> = ctx.registry.all().cloned().collect();
        let mut removed = 0_usize;

        for unit in units(&targets) {
            let label = unit_label(&unit);
            let mut linked = false;
            for target in &unit {
                if probe(target)? == DestinationState::ManagedLink {
                    linked = true;
                    break;
                }
            }
            let Some(first) = unit.first() else {
                continue;
            };
            if !linked {
                ctx.log.debug(&format!("{label}: not linked"));
                continue;
            }

            ctx.deployer.undeploy(first)?;
            ctx.log.success(&format!("{label}: unlinked"));
            report.feature(Feature::Configs, Change::Updated, Some(&label));
            removed += 1;
        }

        if removed == 0 {
            return Ok(TaskResult::Skipped("nothing linked".to_string()));
        }
        Ok(TaskResult::Ok)
    }
}
