//! SSH key generation with `ssh-keygen`.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::exec::Executor;

/// Clipboard tools tried in order, with their arguments.
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("pbcopy", &[]),
];

/// Location of the ed25519 key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Private key.
    pub private: PathBuf,
    /// Public key.
    pub public: PathBuf,
}

impl KeyPair {
    /// `~/.ssh/id_ed25519` and its `.pub`.
    #[must_use]
    pub fn in_home(home: &Path) -> Self {
        let private = home.join(".ssh").join("id_ed25519");
        let public = private.with_extension("pub");
        Self { private, public }
    }

    /// Whether either half already exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.private.symlink_metadata().is_ok() || self.public.symlink_metadata().is_ok()
    }

    /// Generate a new key. Both paths must be free.
    ///
    /// # Errors
    ///
    /// Returns an error if `~/.ssh` cannot be created or `ssh-keygen` fails.
    pub fn generate(&self, executor: &dyn Executor, email: &str, passphrase: &str) -> Result<()> {
        if let Some(dir) = self.private.parent() {
            create_private_dir(dir)?;
        }
        let path = self.private.to_string_lossy();
        executor
            .run(
                "ssh-keygen",
                &["-q", "-t", "ed25519", "-C", email, "-f", &path, "-N", passphrase],
            )
            .context("ssh-keygen")?;
        Ok(())
    }

    /// Register the private key with the running agent.
    ///
    /// # Errors
    ///
    /// Returns an error if `ssh-add` fails.
    pub fn add_to_agent(&self, executor: &dyn Executor) -> Result<()> {
        executor
            .run("ssh-add", &[&self.private.to_string_lossy()])
            .context("ssh-add")?;
        Ok(())
    }

    /// Copy the public key to the first clipboard tool found on `PATH`.
    ///
    /// Returns the tool used, or `None` if no tool is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the public key cannot be read or the tool fails.
    pub fn copy_public_key(&self, executor: &dyn Executor) -> Result<Option<&'static str>> {
        let Some((tool, args)) = CLIPBOARD_TOOLS
            .iter()
            .find(|(tool, _)| executor.which(tool))
        else {
            return Ok(None);
        };
        let key = std::fs::read_to_string(&self.public)
            .with_context(|| format!("reading {}", self.public.display()))?;
        executor
            .run_with_input(tool, args, &key)
            .with_context(|| format!("copying public key with {tool}"))?;
        Ok(Some(*tool))
    }
}

fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
            .with_context(|| format!("restricting {}", dir.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn key_paths() {
        let keys = KeyPair::in_home(Path::new("/home/u"));
        assert_eq!(keys.private, PathBuf::from("/home/u/.ssh/id_ed25519"));
        assert_eq!(keys.public, PathBuf::from("/home/u/.ssh/id_ed25519.pub"));
    }

    #[test]
    fn generate_runs_keygen_and_creates_private_dir() {
        let home = tempfile::tempdir().unwrap();
        let keys = KeyPair::in_home(home.path());
        let exec = MockExecutor::ok("");
        keys.generate(&exec, "me@example.com", "").unwrap();

        let call = &exec.calls()[0];
        assert!(call.starts_with("ssh-keygen -q -t ed25519 -C me@example.com -f "));
        assert!(call.ends_with("id_ed25519 -N "));
        assert!(home.path().join(".ssh").is_dir());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            let mode = std::fs::metadata(home.path().join(".ssh"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }

    #[test]
    fn exists_checks_either_half() {
        let home = tempfile::tempdir().unwrap();
        let keys = KeyPair::in_home(home.path());
        assert!(!keys.exists());
        std::fs::create_dir_all(home.path().join(".ssh")).unwrap();
        std::fs::write(&keys.public, "ssh-ed25519 AAAA").unwrap();
        assert!(keys.exists());
    }

    #[test]
    fn clipboard_skipped_without_tools() {
        let exec = MockExecutor::ok("");
        let keys = KeyPair::in_home(Path::new("/nonexistent"));
        assert_eq!(keys.copy_public_key(&exec).unwrap(), None);
        assert_eq!(exec.call_count(), 0);
    }

    #[test]
    fn clipboard_uses_first_available_tool() {
        let home = tempfile::tempdir().unwrap();
        let keys = KeyPair::in_home(home.path());
        std::fs::create_dir_all(home.path().join(".ssh")).unwrap();
        std::fs::write(&keys.public, "ssh-ed25519 AAAA me@example.com\n").unwrap();
        let exec = MockExecutor::ok("").with_which(true);
        assert_eq!(keys.copy_public_key(&exec).unwrap(), Some("wl-copy"));
        assert_eq!(exec.inputs(), vec!["ssh-ed25519 AAAA me@example.com\n"]);
    }
}
