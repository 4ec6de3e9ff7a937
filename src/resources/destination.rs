//! Classification of what currently lives at a destination path.
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::targets::ManagedTarget;
use crate::error::ProbeError;

/// What currently occupies a destination.
///
/// Computed fresh on every pass and never cached, so a probe always reflects
/// the filesystem as it is now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationState {
    /// Nothing exists at the destination.
    Absent,
    /// A real file or directory that is not a link to the source.
    RegularContent {
        /// The content is a directory.
        is_dir: bool,
    },
    /// The destination resolves to the target's source.
    ManagedLink,
    /// A symlink that resolves somewhere else, or nowhere.
    ForeignLink {
        /// Raw link text.
        points_to: PathBuf,
    },
}

impl DestinationState {
    /// Whether reconciling this state replaces something that already exists.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::RegularContent { .. } | Self::ForeignLink { .. })
    }
}

impl fmt::Display for DestinationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::RegularContent { is_dir: true } => write!(f, "existing directory"),
            Self::RegularContent { is_dir: false } => write!(f, "existing file"),
            Self::ManagedLink => write!(f, "managed link"),
            Self::ForeignLink { points_to } => write!(f, "link to {}", points_to.display()),
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> ProbeError {
    ProbeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Classify `target.destination` against `target.source`.
///
/// Symlinks are compared by canonical path, so relative links and chains of
/// links that end at the source count as managed. A real path that resolves
/// to the source (content reached through a linked parent directory, as a
/// folded stow package produces) is also managed.
///
/// # Errors
///
/// Returns [`ProbeError`] for any I/O failure other than "not found".
pub fn probe(target: &ManagedTarget) -> Result<DestinationState, ProbeError> {
    let dest = &target.destination;
    let meta = match dest.symlink_metadata() {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DestinationState::Absent),
        Err(e) => return Err(io_error(dest, e)),
    };

    let source = dunce::canonicalize(&target.source).ok();

    if !meta.file_type().is_symlink() {
        let resolved = dunce::canonicalize(dest).map_err(|e| io_error(dest, e))?;
        if source.as_deref() == Some(resolved.as_path()) {
            return Ok(DestinationState::ManagedLink);
        }
        return Ok(DestinationState::RegularContent {
            is_dir: meta.is_dir(),
        });
    }

    let points_to = std::fs::read_link(dest).map_err(|e| io_error(dest, e))?;
    match dunce::canonicalize(dest) {
        Ok(resolved) if source.as_deref() == Some(resolved.as_path()) => {
            Ok(DestinationState::ManagedLink)
        }
        Ok(_) => Ok(DestinationState::ForeignLink { points_to }),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(io_error(dest, e)),
        // Dangling link or a loop.
        Err(_) => Ok(DestinationState::ForeignLink { points_to }),
    }
}
