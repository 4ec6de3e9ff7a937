//! The deploy mechanism behind the reconciler.
use anyhow::Result;
use std::path::PathBuf;

use super::stow::StowDeployer;
use super::symlink::SymlinkDeployer;
use crate::config::targets::{ManagedTarget, TargetKind};
use crate::exec::Executor;

/// Makes a target's source visible at its destination, or stops doing so.
#[cfg_attr(test, mockall::automock)]
pub trait Deployer {
    /// Link `target` into place. Any conflicting content has already been
    /// backed up and removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the mechanism fails.
    fn deploy(&self, target: &ManagedTarget) -> Result<()>;

    /// Remove the link for `target`, leaving unrelated content alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the mechanism fails.
    fn undeploy(&self, target: &ManagedTarget) -> Result<()>;
}

/// Routes named groups to stow and everything else to native symlinks.
#[derive(Debug)]
pub struct LinkDeployer<'a> {
    stow: StowDeployer<'a>,
    native: SymlinkDeployer,
}

impl<'a> LinkDeployer<'a> {
    /// A deployer for targets under `root` linked into `home`.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor, root: PathBuf, home: PathBuf) -> Self {
        Self {
            stow: StowDeployer::new(executor, root, home),
            native: SymlinkDeployer,
        }
    }

    fn route(&self, target: &ManagedTarget) -> &dyn Deployer {
        match target.kind {
            TargetKind::NamedGroup(_) => &self.stow,
            TargetKind::SingleFile | TargetKind::Directory => &self.native,
        }
    }
}

impl Deployer for LinkDeployer<'_> {
    fn deploy(&self, target: &ManagedTarget) -> Result<()> {
        self.route(target).deploy(target)
    }

    fn undeploy(&self, target: &ManagedTarget) -> Result<()> {
        self.route(target).undeploy(target)
    }
}
