//! Idempotent resource primitives: probe, back up, deploy, apply.
pub mod backup;
pub mod deploy;
pub mod destination;
pub mod git_identity;
pub mod helpers;
pub mod package;
pub mod plugin;
pub mod ssh_key;
pub mod stow;
pub mod symlink;

/// Result of applying a resource change.
///
/// # Examples
///
/// ```
/// use dotfiles_bootstrap::resources::ResourceChange;
///
/// let created = ResourceChange::Created;
/// let noop = ResourceChange::AlreadyCorrect;
/// let skipped = ResourceChange::Skipped { reason: "not a checkout".into() };
///
/// assert_ne!(created, noop);
/// assert_ne!(noop, skipped);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource did not exist and was created.
    Created,
    /// Resource existed and was brought up to date.
    Updated,
    /// Resource was already correct (no change needed).
    AlreadyCorrect,
    /// Resource was left alone.
    Skipped {
        /// Reason why the resource was skipped.
        reason: String,
    },
}
