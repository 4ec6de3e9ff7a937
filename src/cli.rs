//! Command-line interface definitions.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry point for the bootstrap engine.
#[derive(Parser, Debug)]
#[command(
    name = "bootstrap",
    about = "Install packages, link dotfiles and set up git and ssh identity",
    version
)]
pub struct Cli {
    #[allow(missing_docs)]
    #[command(subcommand)]
    pub command: Command,

    /// Show external command output and debug messages
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[allow(missing_docs)]
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Never prompt; fail when required input is missing
    #[arg(short = 'y', long, global = true)]
    pub unattended: bool,

    /// Replace existing files without asking (backups are still taken)
    #[arg(long, global = true)]
    pub skip_confirmation: bool,

    /// Override dotfiles root directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Override home directory
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    #[allow(missing_docs)]
    #[command(flatten)]
    pub identity: IdentityOpts,
}

/// Identity values; each falls back to its environment variable.
#[derive(Args, Debug, Clone, Default)]
pub struct IdentityOpts {
    /// Git user name [env: GIT_NAME]
    #[arg(long, global = true, value_name = "NAME")]
    pub git_name: Option<String>,

    /// Git user email [env: GIT_EMAIL]
    #[arg(long, global = true, value_name = "EMAIL")]
    pub git_email: Option<String>,

    /// Email used as the SSH key comment [env: SSH_EMAIL]
    #[arg(long, global = true, value_name = "EMAIL")]
    pub ssh_email: Option<String>,

    /// Fallback for both git and ssh email [env: EMAIL]
    #[arg(long, global = true, value_name = "EMAIL")]
    pub email: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every step: packages, configs, theme, plugins, git, ssh
    Install(InstallOpts),
    /// Deploy configuration targets only
    Link,
    /// Configure git identity
    Git,
    /// Generate an SSH key
    Ssh,
    /// Remove deployed links
    Uninstall,
    /// Print version information
    Version,
}

/// Options for the `install` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallOpts {
    /// Skip specific steps
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Run only specific steps
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Link => "link",
            Self::Git => "git",
            Self::Ssh => "ssh",
            Self::Uninstall => "uninstall",
            Self::Version => "version",
        }
    }
}
