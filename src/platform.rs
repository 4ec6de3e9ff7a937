//! Host platform detection.
use std::fmt;

use crate::error::PlatformError;
use crate::exec::Executor;
use crate::resources::package::PackageManager;

/// Detected operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Any Linux distribution.
    Linux,
    /// macOS.
    MacOs,
    /// Anything else; treated like Linux.
    Other,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "macos"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone, Copy)]
pub struct Platform {
    /// Operating system the binary was built for.
    pub os: Os,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub const fn detect() -> Self {
        let os = if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "macos") {
            Os::MacOs
        } else {
            Os::Other
        };
        Self { os }
    }

    /// Create a platform with an explicit OS (for testing).
    #[cfg(test)]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// Pick the package manager available on `PATH`.
    ///
    /// macOS always uses Homebrew. Linux prefers apt and falls back to
    /// Homebrew on Linux.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnsupportedPackageManager`] when neither is
    /// installed.
    pub fn package_manager(&self, executor: &dyn Executor) -> Result<PackageManager, PlatformError> {
        let candidates: &[(&str, PackageManager)] = match self.os {
            Os::MacOs => &[("brew", PackageManager::Homebrew)],
            Os::Linux | Os::Other => &[
                ("apt-get", PackageManager::Apt),
                ("brew", PackageManager::Homebrew),
            ],
        };
        candidates
            .iter()
            .find(|(program, _)| executor.which(program))
            .map(|(_, manager)| *manager)
            .ok_or(PlatformError::UnsupportedPackageManager)
    }
}
