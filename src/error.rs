//! Domain-specific error types for the bootstrap engine.
//!
//! Internal modules return typed errors (e.g. [`ConfigError`],
//! [`ReconcileError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator. `main` downcasts back to
//! [`BootstrapError`] to pick the process exit code.
//!
//! # Error hierarchy
//!
//! ```text
//! BootstrapError
//! ├── Config(ConfigError)        : missing sources/templates, bad bootstrap.toml
//! ├── Validation(ValidationError): missing or malformed identity input
//! ├── Reconcile(ReconcileError)  : probe, backup, deploy and verification failures
//! │   ├── Probe(ProbeError)
//! │   └── Backup(BackupError)
//! ├── Platform(PlatformError)    : unsupported package manager
//! └── Cancelled                  : the user declined a prompt
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::resources::destination::DestinationState;

/// Exit status for a successful run.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status for any failure.
pub const EXIT_FAILURE: u8 = 1;
/// Exit status when the user cancelled; callers treat it as "skip, don't alarm".
pub const EXIT_CANCELLED: u8 = 2;

/// Top-level error type for the bootstrap engine.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Configuration error (missing source, missing template, unreadable config).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Identity input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A managed target could not be reconciled.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// The host platform is not supported.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The user declined a prompt.
    #[error("cancelled by user")]
    Cancelled,
}

impl BootstrapError {
    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Cancelled => EXIT_CANCELLED,
            _ => EXIT_FAILURE,
        }
    }
}

/// Map an error returned by a command to the process exit status.
///
/// Errors that do not carry a [`BootstrapError`] anywhere in their chain are
/// generic failures.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<BootstrapError>())
        .map_or(EXIT_FAILURE, BootstrapError::exit_code)
}

/// Errors that arise from configuration loading and validation.
///
/// All of these are detected before the filesystem is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A managed target's source does not exist in the dotfiles repository.
    #[error("source for {destination} does not exist: {source_path}")]
    MissingSource {
        /// Destination the target would have been deployed to.
        destination: PathBuf,
        /// Expected source path.
        source_path: PathBuf,
    },

    /// A template required to generate a configuration file is missing.
    #[error("template not found: {0}")]
    MissingTemplate(PathBuf),

    /// `bootstrap.toml` could not be parsed.
    #[error("invalid configuration in {path}: {message}")]
    InvalidSyntax {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A configuration file could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The dotfiles repository root could not be located.
    #[error("cannot determine dotfiles root; use --root or set DOTFILES_ROOT")]
    RootNotFound,

    /// The home directory could not be determined.
    #[error("HOME is not set; use --home")]
    HomeNotSet,
}

/// Errors raised while validating user-supplied identity input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required value was not provided by flag, environment or prompt.
    #[error("{field} is required (set {hint})")]
    Missing {
        /// Human-readable name of the field.
        field: &'static str,
        /// Flags or environment variables that can provide it.
        hint: &'static str,
    },

    /// A value was provided but is blank.
    #[error("{field} must not be empty")]
    Empty {
        /// Human-readable name of the field.
        field: &'static str,
    },

    /// An email address is malformed.
    #[error("invalid email address: '{0}'")]
    InvalidEmail(String),
}

/// Errors raised while classifying a destination.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// An unexpected I/O error (anything other than "not found").
    #[error("cannot inspect {path}: {source}")]
    Io {
        /// Path being probed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised by the backup store.
#[derive(Error, Debug)]
pub enum BackupError {
    /// The path to back up does not exist.
    #[error("nothing to back up at {0}")]
    NotFound(PathBuf),

    /// The backup directory could not be created.
    #[error("cannot create backup directory {path}: {source}")]
    CreateRoot {
        /// Backup directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Copying or moving content into the backup directory failed.
    #[error("cannot back up {from} to {to}: {source}")]
    Write {
        /// Original path.
        from: PathBuf,
        /// Backup path.
        to: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised while reconciling a managed target.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The target's source disappeared between validation and deployment.
    #[error("source does not exist: {0}")]
    MissingSource(PathBuf),

    /// The destination could not be classified.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// The destination could not be backed up.
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// The original destination could not be removed after backing it up.
    #[error("cannot remove {path}: {source}")]
    Remove {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Reading an overwrite confirmation failed.
    #[error("cannot read confirmation for {path}: {source}")]
    Prompt {
        /// Destination path the question was about.
        path: PathBuf,
        /// Underlying prompt error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The deploy mechanism reported failure.
    #[error("deploying {target} failed: {source}")]
    Deploy {
        /// Label of the unit being deployed (group name or destination).
        target: String,
        /// Underlying error from the deploy mechanism.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// After deploying, the destination is still not a managed link.
    #[error("{path} is not linked after deploy (found {found})")]
    Verification {
        /// Destination path.
        path: PathBuf,
        /// State observed on re-probe.
        found: DestinationState,
    },
}

/// Errors that arise from platform detection.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Neither supported package manager is available.
    #[error("no supported package manager found (need apt-get or brew)")]
    UnsupportedPackageManager,
}
