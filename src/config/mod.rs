//! Run configuration: CLI flags and environment folded into one immutable value.
pub mod identity;
pub mod settings;
pub mod targets;

use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::error::ConfigError;
use crate::reconcile::OverwritePolicy;
use identity::IdentityInputs;

/// Whether the run may ask questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Prompts are allowed.
    Interactive,
    /// No prompts; missing input is an error.
    Unattended,
}

/// Everything a command needs to know about this invocation.
///
/// Built once in `main` and passed by reference.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Interactive or unattended.
    pub mode: Mode,
    /// Stream external command output and show debug messages.
    pub verbose: bool,
    /// Replace existing destinations without asking.
    pub skip_confirmation: bool,
    /// Dotfiles repository root.
    pub root: PathBuf,
    /// Home directory all destinations live under.
    pub home: PathBuf,
    /// Identity values from flags and environment.
    pub identity: IdentityInputs,
    /// An ssh agent is reachable (`SSH_AUTH_SOCK` is set).
    pub agent_available: bool,
}

impl RunConfig {
    /// Build the run configuration from parsed flags.
    ///
    /// `env` looks up environment variables; `main` passes `std::env::var`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RootNotFound`] or [`ConfigError::HomeNotSet`].
    pub fn from_cli(
        global: &GlobalOpts,
        verbose: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let home = match &global.home {
            Some(home) => home.clone(),
            None => env("HOME")
                .filter(|h| !h.is_empty())
                .map(PathBuf::from)
                .ok_or(ConfigError::HomeNotSet)?,
        };

        let exe = std::env::current_exe().ok();
        let cwd = std::env::current_dir().ok();
        let root = resolve_root(
            global.root.as_deref(),
            env("DOTFILES_ROOT").filter(|r| !r.is_empty()).as_deref(),
            exe.as_deref(),
            cwd.as_deref(),
        )?;

        Ok(Self {
            mode: if global.unattended {
                Mode::Unattended
            } else {
                Mode::Interactive
            },
            verbose,
            skip_confirmation: global.skip_confirmation,
            root,
            home,
            identity: IdentityInputs::collect(&global.identity, &env),
            agent_available: env("SSH_AUTH_SOCK").is_some_and(|s| !s.is_empty()),
        })
    }

    /// How conflicting destinations are handled.
    #[must_use]
    pub const fn overwrite_policy(&self) -> OverwritePolicy {
        match self.mode {
            Mode::Interactive if !self.skip_confirmation => OverwritePolicy::Ask,
            Mode::Interactive | Mode::Unattended => OverwritePolicy::Replace,
        }
    }

    /// Whether prompts may be shown.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.mode == Mode::Interactive
    }
}

/// A directory looks like a dotfiles checkout if it carries the settings
/// file or the git template.
fn is_dotfiles_root(dir: &Path) -> bool {
    dir.join(settings::SETTINGS_FILE).is_file()
        || dir
            .join(targets::GIT_GROUP)
            .join(targets::GIT_TEMPLATE_FILE)
            .is_file()
}

/// Locate the dotfiles repository.
///
/// Order: explicit flag, `DOTFILES_ROOT`, an ancestor of the binary, then an
/// ancestor of the working directory.
///
/// # Errors
///
/// Returns [`ConfigError::RootNotFound`] if nothing matches.
pub fn resolve_root(
    flag: Option<&Path>,
    env_root: Option<&str>,
    exe: Option<&Path>,
    cwd: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    if let Some(root) = flag {
        return Ok(root.to_path_buf());
    }
    if let Some(root) = env_root {
        return Ok(PathBuf::from(root));
    }

    let from_exe = exe
        .and_then(Path::parent)
        .and_then(|dir| dir.ancestors().find(|a| is_dotfiles_root(a)));
    let from_cwd = || cwd.and_then(|dir| dir.ancestors().find(|a| is_dotfiles_root(a)));

    from_exe
        .or_else(from_cwd)
        .map(|p| dunce::canonicalize(p).unwrap_or_else(|_| p.to_path_buf()))
        .ok_or(ConfigError::RootNotFound)
}
