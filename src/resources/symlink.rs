//! Native symlinks for single-file and directory targets.
use anyhow::{Context as _, Result};
use std::path::Path;

use super::deploy::Deployer;
use super::destination::{DestinationState, probe};
use super::helpers::fs::{ensure_parent_dir, remove_path};
use crate::config::targets::ManagedTarget;

/// Links `destination` to `source` directly, without the symlink-farm tool.
///
/// The destination must already be clear; the reconciler backs up and removes
/// anything in the way before calling [`Deployer::deploy`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkDeployer;

impl Deployer for SymlinkDeployer {
    fn deploy(&self, target: &ManagedTarget) -> Result<()> {
        ensure_parent_dir(&target.destination)
            .with_context(|| format!("create parent: {}", target.destination.display()))?;
        create_symlink(&target.source, &target.destination)
    }

    fn undeploy(&self, target: &ManagedTarget) -> Result<()> {
        if probe(target)? == DestinationState::ManagedLink
            && target
                .destination
                .symlink_metadata()
                .is_ok_and(|m| m.file_type().is_symlink())
        {
            remove_path(&target.destination)
                .with_context(|| format!("remove link: {}", target.destination.display()))?;
        }
        Ok(())
    }
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).with_context(|| {
            format!(
                "creating symlink {} -> {}",
                link.display(),
                target.display()
            )
        })?;
    }

    #[cfg(windows)]
    {
        let result = if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        result.with_context(|| {
            format!(
                "creating symlink {} -> {}",
                link.display(),
                target.display()
            )
        })?;
    }

    Ok(())
}
