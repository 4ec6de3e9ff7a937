//! `bootstrap.toml` loading.
//!
//! The file is optional. When absent, the built-in layout is used: `zsh`,
//! `tmux` and `nvim` groups, a `git` group generated from its template, a
//! small package list and the tmux/zsh plugin managers.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::targets::{
    GIT_CONFIG_FILE, GIT_GROUP, GIT_TEMPLATE_FILE, ManagedTarget, TargetRegistry,
};
use crate::error::ConfigError;

/// Name of the settings file at the repository root.
pub const SETTINGS_FILE: &str = "bootstrap.toml";

/// Default backup directory, relative to the home directory.
pub const DEFAULT_BACKUP_DIR: &str = ".dotfiles-backup";

/// A single entry in the `targets` list: either a member of a named group or
/// an explicit `{ source, destination }` link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TargetEntry {
    /// `{ group = "zsh", path = ".zshrc" }`, deployed by the symlink-farm tool.
    Group {
        /// Group directory under the repository root.
        group: String,
        /// Path inside the group, mirrored under `$HOME`.
        path: String,
    },
    /// `{ source = "bin/tool", destination = ".local/bin/tool" }`, linked directly.
    Link {
        /// Path relative to the repository root.
        source: String,
        /// Path relative to the home directory.
        destination: String,
    },
}

impl TargetEntry {
    fn resolve(&self, root: &Path, home: &Path) -> ManagedTarget {
        match self {
            Self::Group { group, path } => ManagedTarget::group_member(root, home, group, path),
            Self::Link {
                source,
                destination,
            } => ManagedTarget::link(root.join(source), home.join(destination)),
        }
    }
}

/// Package lists.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackageLists {
    /// Installed in one batch; failure aborts the run.
    pub core: Vec<String>,
    /// Installed one by one; failures are warnings.
    pub optional: Vec<String>,
}

impl Default for PackageLists {
    fn default() -> Self {
        Self {
            core: ["git", "stow", "zsh", "tmux", "curl"]
                .map(String::from)
                .to_vec(),
            optional: ["neovim", "ripgrep", "fzf"].map(String::from).to_vec(),
        }
    }
}

/// A plugin manager cloned from git.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginManager {
    /// Display name.
    pub name: String,
    /// Clone URL.
    pub repo: String,
    /// Checkout location relative to the home directory.
    pub path: String,
}

fn default_plugins() -> Vec<PluginManager> {
    vec![
        PluginManager {
            name: "tpm".to_string(),
            repo: "https://github.com/tmux-plugins/tpm".to_string(),
            path: ".tmux/plugins/tpm".to_string(),
        },
        PluginManager {
            name: "zinit".to_string(),
            repo: "https://github.com/zdharma-continuum/zinit.git".to_string(),
            path: ".local/share/zinit/zinit.git".to_string(),
        },
    ]
}

fn default_targets() -> Vec<TargetEntry> {
    [("zsh", ".zshrc"), ("tmux", ".tmux.conf"), ("nvim", ".config/nvim")]
        .into_iter()
        .map(|(group, path)| TargetEntry::Group {
            group: group.to_string(),
            path: path.to_string(),
        })
        .collect()
}

fn default_backup_dir() -> String {
    DEFAULT_BACKUP_DIR.to_string()
}

/// Parsed `bootstrap.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Backup directory relative to the home directory.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
    /// Packages to install.
    #[serde(default)]
    pub packages: PackageLists,
    /// Core configuration targets.
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetEntry>,
    /// Optional terminal theme target.
    #[serde(default)]
    pub theme: Option<TargetEntry>,
    /// Plugin managers.
    #[serde(default = "default_plugins")]
    pub plugins: Vec<PluginManager>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            packages: PackageLists::default(),
            targets: default_targets(),
            theme: None,
            plugins: default_plugins(),
        }
    }
}

impl Settings {
    /// Load `bootstrap.toml` from `root`, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content, &path)
    }

    /// Parse settings from TOML text. `path` is used for error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSyntax`] if the text is not valid settings.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidSyntax {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// Absolute backup directory.
    #[must_use]
    pub fn backup_root(&self, home: &Path) -> PathBuf {
        home.join(&self.backup_dir)
    }

    /// Build the target registry for this repository and home directory.
    #[must_use]
    pub fn registry(&self, root: &Path, home: &Path) -> TargetRegistry {
        TargetRegistry {
            configs: self
                .targets
                .iter()
                .map(|entry| entry.resolve(root, home))
                .collect(),
            theme: self.theme.as_ref().map(|entry| entry.resolve(root, home)),
            git: ManagedTarget::group_member(root, home, GIT_GROUP, GIT_CONFIG_FILE),
            git_template: root.join(GIT_GROUP).join(GIT_TEMPLATE_FILE),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::targets::TargetKind;

    fn parse(content: &str) -> Settings {
        Settings::parse(content, Path::new("bootstrap.toml")).unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(parse(""), Settings::default());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load(dir.path()).unwrap(), Settings::default());
    }

    #[test]
    fn parses_group_and_link_targets() {
        let s = parse(
            r#"
targets = [
  { group = "zsh", path = ".zshrc" },
  { source = "bin/tool", destination = ".local/bin/tool" },
]
"#,
        );
        assert_eq!(s.targets.len(), 2);
        assert!(matches!(s.targets[0], TargetEntry::Group { .. }));
        assert!(matches!(s.targets[1], TargetEntry::Link { .. }));
    }

    #[test]
    fn parses_packages_and_theme() {
        let s = parse(
            r#"
backup_dir = ".backups"
theme = { group = "theme", path = ".config/alacritty/theme.toml" }

[packages]
core = ["git"]
"#,
        );
        assert_eq!(s.backup_dir, ".backups");
        assert_eq!(s.packages.core, vec!["git"]);
        assert!(s.packages.optional.is_empty());
        assert!(s.theme.is_some());
    }

    #[test]
    fn parses_plugins() {
        let s = parse(
            r#"
[[plugins]]
name = "tpm"
repo = "https://github.com/tmux-plugins/tpm"
path = ".tmux/plugins/tpm"
"#,
        );
        assert_eq!(s.plugins.len(), 1);
        assert_eq!(s.plugins[0].name, "tpm");
    }

    #[test]
    fn unknown_key_is_a_syntax_error() {
        let err = Settings::parse("colour = true", Path::new("bootstrap.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSyntax { .. }));
    }

    #[test]
    fn registry_resolves_paths() {
        let reg = Settings::default().registry(Path::new("/dots"), Path::new("/home/u"));
        assert_eq!(reg.configs.len(), 3);
        assert_eq!(reg.configs[0].source, PathBuf::from("/dots/zsh/.zshrc"));
        assert_eq!(reg.configs[0].destination, PathBuf::from("/home/u/.zshrc"));
        assert_eq!(reg.git.destination, PathBuf::from("/home/u/.gitconfig"));
        assert_eq!(
            reg.git_template,
            PathBuf::from("/dots/git/.gitconfig.template")
        );
        assert_eq!(reg.git.kind, TargetKind::NamedGroup("git".to_string()));
    }

    #[test]
    fn backup_root_is_under_home() {
        let s = Settings::default();
        assert_eq!(
            s.backup_root(Path::new("/home/u")),
            PathBuf::from("/home/u/.dotfiles-backup")
        );
    }
}
