//! Console and file logger used by every component.
use std::path::PathBuf;

use super::subscriber::{SKIP, STAGE, SUCCESS};
use super::utils::log_file_path;

/// Structured logger.
///
/// Every state transition goes through one of these methods so that it is
/// printed as a single annotated line and appended to the persistent log file
/// at `$XDG_CACHE_HOME/bootstrap/<command>.log`. The file itself is written by
/// the [`FileLayer`](super::subscriber::FileLayer) installed by
/// [`init_subscriber`](super::init_subscriber).
#[derive(Debug, Default)]
pub struct Logger {
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a logger for `command`, remembering where its log file lives.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            log_file: log_file_path(command),
        }
    }

    /// Path of the persistent log file, if the cache directory is usable.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a change that was applied.
    pub fn success(&self, msg: &str) {
        tracing::info!(target: SUCCESS, "{msg}");
    }

    /// Log something that was left alone.
    pub fn skip(&self, msg: &str) {
        tracing::info!(target: SKIP, "{msg}");
    }

    /// Log a debug message (console only with `--verbose`; always in the file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Print the location of the log file, if any.
    pub fn print_log_location(&self) {
        if let Some(path) = &self.log_file {
            self.info(&format!("log: {}", path.display()));
        }
    }
}
