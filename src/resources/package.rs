//! System package installation through apt or Homebrew.
use std::collections::HashSet;

use anyhow::Result;

use super::ResourceChange;
use crate::exec::Executor;

/// Supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// Debian and Ubuntu (`apt-get`, queried with `dpkg-query`).
    Apt,
    /// macOS and Linuxbrew (`brew`).
    Homebrew,
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apt => write!(f, "apt"),
            Self::Homebrew => write!(f, "homebrew"),
        }
    }
}

/// Query the set of installed package names with a single command.
///
/// A failing query yields an empty set, so every package is treated as
/// missing and the install command decides.
///
/// # Errors
///
/// Returns an error if the query program cannot be spawned.
pub fn installed_packages(
    manager: PackageManager,
    executor: &dyn Executor,
) -> Result<HashSet<String>> {
    let result = match manager {
        PackageManager::Apt => executor.run_unchecked(
            "dpkg-query",
            &["-W", "-f=${db:Status-Status} ${Package}\n"],
        )?,
        PackageManager::Homebrew => executor.run_unchecked("brew", &["list", "--formula", "-1"])?,
    };
    if !result.success {
        return Ok(HashSet::new());
    }
    let names = result.stdout.lines().filter_map(|line| match manager {
        PackageManager::Apt => line
            .strip_prefix("installed ")
            .map(|name| name.trim().to_string()),
        PackageManager::Homebrew => {
            let name = line.trim();
            (!name.is_empty()).then(|| name.to_string())
        }
    });
    Ok(names.collect())
}

/// Names from `wanted` that are not in `installed`, in their original order.
#[must_use]
pub fn missing<'a>(wanted: &'a [String], installed: &HashSet<String>) -> Vec<&'a str> {
    wanted
        .iter()
        .filter(|name| !installed.contains(name.as_str()))
        .map(String::as_str)
        .collect()
}

/// Install `names` in one command.
///
/// # Errors
///
/// Returns an error if the package manager exits non-zero.
pub fn install(
    manager: PackageManager,
    executor: &dyn Executor,
    names: &[&str],
) -> Result<ResourceChange> {
    if names.is_empty() {
        return Ok(ResourceChange::AlreadyCorrect);
    }
    match manager {
        PackageManager::Apt => {
            let mut args = vec!["apt-get", "install", "-y"];
            args.extend_from_slice(names);
            executor.run("sudo", &args)?;
        }
        PackageManager::Homebrew => {
            let mut args = vec!["install"];
            args.extend_from_slice(names);
            executor.run("brew", &args)?;
        }
    }
    Ok(ResourceChange::Created)
}
