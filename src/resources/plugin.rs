//! Plugin managers installed as git checkouts.
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::ResourceChange;
use super::helpers::fs::ensure_parent_dir;
use crate::exec::Executor;

/// A plugin manager checkout.
#[derive(Debug)]
pub struct PluginCheckout<'a> {
    /// Display name.
    pub name: &'a str,
    /// Clone URL.
    pub repo: &'a str,
    /// Checkout directory.
    pub path: PathBuf,
}

impl PluginCheckout<'_> {
    /// Clone when missing, fast-forward when present.
    ///
    /// A directory that is not a git checkout is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if `git` fails.
    pub fn apply(&self, executor: &dyn Executor) -> Result<ResourceChange> {
        let path = self.path.to_string_lossy();
        if self.path.join(".git").exists() {
            let before = head(executor, &path);
            executor
                .run("git", &["-C", &path, "pull", "--ff-only", "--quiet"])
                .with_context(|| format!("updating {}", self.name))?;
            let after = head(executor, &path);
            return Ok(if before.is_some() && before == after {
                ResourceChange::AlreadyCorrect
            } else {
                ResourceChange::Updated
            });
        }
        if self.path.exists() {
            return Ok(ResourceChange::Skipped {
                reason: format!("{} exists and is not a git checkout", self.path.display()),
            });
        }
        ensure_parent_dir(&self.path)
            .with_context(|| format!("creating parent of {}", self.path.display()))?;
        executor
            .run("git", &["clone", "--depth", "1", "--quiet", self.repo, &path])
            .with_context(|| format!("cloning {}", self.name))?;
        Ok(ResourceChange::Created)
    }
}

fn head(executor: &dyn Executor, path: &str) -> Option<String> {
    executor
        .run_unchecked("git", &["-C", path, "rev-parse", "HEAD"])
        .ok()
        .filter(|r| r.success)
        .map(|r| r.stdout.trim().to_string())
}
