//! Managed configuration targets and the registry that lists them.
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Group whose generated `.gitconfig` carries the git identity.
pub const GIT_GROUP: &str = "git";
/// File name of the generated git configuration inside [`GIT_GROUP`].
pub const GIT_CONFIG_FILE: &str = ".gitconfig";
/// Template the git configuration is rendered from.
pub const GIT_TEMPLATE_FILE: &str = ".gitconfig.template";

/// How a target is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A single file linked directly.
    SingleFile,
    /// A directory linked directly.
    Directory,
    /// Part of a group deployed atomically by the symlink-farm tool.
    NamedGroup(String),
}

impl TargetKind {
    /// Group name for [`TargetKind::NamedGroup`] targets.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        match self {
            Self::NamedGroup(name) => Some(name),
            Self::SingleFile | Self::Directory => None,
        }
    }
}

/// One file or directory under configuration management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedTarget {
    /// Canonical, version-controlled content.
    pub source: PathBuf,
    /// Where the content must be visible (under the home directory).
    pub destination: PathBuf,
    /// Deployment mechanism.
    pub kind: TargetKind,
}

impl ManagedTarget {
    /// A target deployed as a member of a named group.
    ///
    /// `relative` is both the path inside `<root>/<group>/` and the path
    /// under `home`, which is the symlink-farm layout.
    #[must_use]
    pub fn group_member(root: &Path, home: &Path, group: &str, relative: &str) -> Self {
        Self {
            source: root.join(group).join(relative),
            destination: home.join(relative),
            kind: TargetKind::NamedGroup(group.to_string()),
        }
    }

    /// A target linked directly; the kind follows whether `source` is a directory.
    #[must_use]
    pub fn link(source: PathBuf, destination: PathBuf) -> Self {
        let kind = if source.is_dir() {
            TargetKind::Directory
        } else {
            TargetKind::SingleFile
        };
        Self {
            source,
            destination,
            kind,
        }
    }

    /// Fail with a configuration error if the source is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSource`] if `source` does not exist.
    pub fn ensure_source(&self) -> Result<(), ConfigError> {
        if self.source.symlink_metadata().is_ok() {
            Ok(())
        } else {
            Err(ConfigError::MissingSource {
                destination: self.destination.clone(),
                source_path: self.source.clone(),
            })
        }
    }
}

impl fmt::Display for ManagedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.destination.display())
    }
}

/// Every target the bootstrap engine manages.
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    /// Core configuration targets (deployed by `link` and `install`).
    pub configs: Vec<ManagedTarget>,
    /// Optional terminal theme.
    pub theme: Option<ManagedTarget>,
    /// Generated git configuration.
    pub git: ManagedTarget,
    /// Template the git configuration is rendered from.
    pub git_template: PathBuf,
}

impl TargetRegistry {
    /// Check that every static source and the git template exist.
    ///
    /// The generated git configuration is excluded since it is produced at
    /// run time from the template.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for target in self.configs.iter().chain(self.theme.iter()) {
            target.ensure_source()?;
        }
        self.validate_git_template()
    }

    /// Check only that the git template exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingTemplate`] if the template is absent.
    pub fn validate_git_template(&self) -> Result<(), ConfigError> {
        if self.git_template.is_file() {
            Ok(())
        } else {
            Err(ConfigError::MissingTemplate(self.git_template.clone()))
        }
    }

    /// All targets, in deployment order.
    pub fn all(&self) -> impl Iterator<Item = &ManagedTarget> {
        self.configs
            .iter()
            .chain(self.theme.iter())
            .chain(std::iter::once(&self.git))
    }
}
