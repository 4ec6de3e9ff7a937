//! GNU stow as the deploy mechanism for named groups.
use anyhow::{Context as _, Result, bail};
use std::path::PathBuf;

use super::deploy::Deployer;
use crate::config::targets::ManagedTarget;
use crate::exec::Executor;

/// Refreshes whole groups with `stow --restow` and removes them with
/// `stow --delete`.
///
/// Every member of a group is linked together, so deploying any one member
/// deploys all of them. Files ending in `.template` are never linked; they are
/// inputs for rendered files such as `.gitconfig`.
#[derive(Debug)]
pub struct StowDeployer<'a> {
    executor: &'a dyn Executor,
    root: PathBuf,
    home: PathBuf,
}

impl<'a> StowDeployer<'a> {
    /// A deployer linking groups under `root` into `home`.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor, root: PathBuf, home: PathBuf) -> Self {
        Self {
            executor,
            root,
            home,
        }
    }

    fn stow(&self, action: &str, group: &str) -> Result<()> {
        let target = self.home.to_string_lossy();
        let dir = self.root.to_string_lossy();
        self.executor
            .run(
                "stow",
                &[
                    action,
                    IGNORE_TEMPLATES,
                    "--target",
                    &target,
                    "--dir",
                    &dir,
                    group,
                ],
            )
            .with_context(|| format!("stow {action} {group}"))?;
        Ok(())
    }
}

fn group_of(target: &ManagedTarget) -> Result<&str> {
    match target.kind.group() {
        Some(group) => Ok(group),
        None => bail!("{} is not part of a stow group", target.destination.display()),
    }
}

/// Passed to every stow invocation.
const IGNORE_TEMPLATES: &str = r"--ignore=\.template$";

impl Deployer for StowDeployer<'_> {
    fn deploy(&self, target: &ManagedTarget) -> Result<()> {
        self.stow("--restow", group_of(target)?)
    }

    fn undeploy(&self, target: &ManagedTarget) -> Result<()> {
        self.stow("--delete", group_of(target)?)
    }
}
