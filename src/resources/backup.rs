//! Timestamped backups of content about to be replaced.
//!
//! Every backup lands flat in one directory as
//! `<name>.<YYYYMMDD_HHMMSS>[.N]`, where `name` is the home-relative path with
//! separators replaced by `__`. Existing backups are never overwritten or
//! pruned.
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};

use super::helpers::fs::{copy_tree, move_tree};
use crate::error::BackupError;

/// Timestamp format used in backup names; lexically sortable.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Whether the original stays in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupMode {
    /// Copy; the original is left for the caller to remove.
    Copy,
    /// Move; the original is gone afterwards.
    Move,
}

/// One backup taken during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    /// Where the content used to live.
    pub original_path: PathBuf,
    /// Where it lives now.
    pub backup_path: PathBuf,
    /// Local time the backup was taken, in [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
    /// The content was a directory.
    pub was_directory: bool,
}

/// The backup directory.
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
    home: PathBuf,
}

impl BackupStore {
    /// A store writing into `root`; names are relative to `home`.
    #[must_use]
    pub const fn new(root: PathBuf, home: PathBuf) -> Self {
        Self { root, home }
    }

    /// The backup directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Back up `path` now.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError`] if `path` does not exist or cannot be copied.
    pub fn backup(&self, path: &Path, mode: BackupMode) -> Result<BackupRecord, BackupError> {
        self.backup_at(path, mode, Local::now())
    }

    /// Back up `path` using `now` as the timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError`] if `path` does not exist or cannot be copied.
    pub fn backup_at(
        &self,
        path: &Path,
        mode: BackupMode,
        now: DateTime<Local>,
    ) -> Result<BackupRecord, BackupError> {
        let meta = path
            .symlink_metadata()
            .map_err(|_| BackupError::NotFound(path.to_path_buf()))?;
        self.ensure_root()?;

        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let backup_path = self.free_name(&format!("{}.{timestamp}", self.name_for(path)));

        let result = match mode {
            BackupMode::Copy => copy_tree(path, &backup_path),
            BackupMode::Move => move_tree(path, &backup_path),
        };
        result.map_err(|source| BackupError::Write {
            from: path.to_path_buf(),
            to: backup_path.clone(),
            source,
        })?;

        Ok(BackupRecord {
            original_path: path.to_path_buf(),
            backup_path,
            timestamp,
            was_directory: meta.is_dir(),
        })
    }

    /// Flat name for `path`: home-relative components joined with `__`.
    fn name_for(&self, path: &Path) -> String {
        let parts: Vec<String> = path
            .strip_prefix(&self.home)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(|rel| {
                rel.components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        if parts.is_empty() {
            path.file_name().map_or_else(
                || "backup".to_string(),
                |n| n.to_string_lossy().into_owned(),
            )
        } else {
            parts.join("__")
        }
    }

    /// First of `base`, `base.1`, `base.2`, … that does not exist yet.
    fn free_name(&self, base: &str) -> PathBuf {
        let candidate = self.root.join(base);
        if candidate.symlink_metadata().is_err() {
            return candidate;
        }
        (1_u32..)
            .map(|n| self.root.join(format!("{base}.{n}")))
            .find(|p| p.symlink_metadata().is_err())
            .unwrap_or(candidate)
    }

    fn ensure_root(&self) -> Result<(), BackupError> {
        if self.root.is_dir() {
            return Ok(());
        }
        let create = |source| BackupError::CreateRoot {
            path: self.root.clone(),
            source,
        };
        std::fs::create_dir_all(&self.root).map_err(create)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            std::fs::set_permissions(&self.root, std::fs::Permissions::from_mode(0o700))
                .map_err(create)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    struct Fixture {
        _dir: tempfile::TempDir,
        home: PathBuf,
        store: BackupStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).unwrap();
        let store = BackupStore::new(home.join(".dotfiles-backup"), home.clone());
        Fixture {
            _dir: dir,
            home,
            store,
        }
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn copies_file_with_timestamped_name() {
        let f = fixture();
        let zshrc = f.home.join(".zshrc");
        std::fs::write(&zshrc, "X").unwrap();

        let rec = f.store.backup_at(&zshrc, BackupMode::Copy, fixed_time()).unwrap();

        assert_eq!(rec.timestamp, "20240309_140507");
        assert_eq!(
            rec.backup_path,
            f.home.join(".dotfiles-backup/.zshrc.20240309_140507")
        );
        assert_eq!(std::fs::read_to_string(&rec.backup_path).unwrap(), "X");
        assert_eq!(std::fs::read_to_string(&zshrc).unwrap(), "X");
        assert!(!rec.was_directory);
    }

    #[test]
    fn nested_paths_are_flattened() {
        let f = fixture();
        let init = f.home.join(".config/nvim/init.lua");
        std::fs::create_dir_all(init.parent().unwrap()).unwrap();
        std::fs::write(&init, "-- lua").unwrap();

        let rec = f.store.backup_at(&init, BackupMode::Copy, fixed_time()).unwrap();

        assert_eq!(
            rec.backup_path.file_name().unwrap(),
            ".config__nvim__init.lua.20240309_140507"
        );
    }

    #[test]
    fn same_second_backups_get_suffixes() {
        let f = fixture();
        let zshrc = f.home.join(".zshrc");
        std::fs::write(&zshrc, "1").unwrap();

        let first = f.store.backup_at(&zshrc, BackupMode::Copy, fixed_time()).unwrap();
        std::fs::write(&zshrc, "2").unwrap();
        let second = f.store.backup_at(&zshrc, BackupMode::Copy, fixed_time()).unwrap();
        std::fs::write(&zshrc, "3").unwrap();
        let third = f.store.backup_at(&zshrc, BackupMode::Copy, fixed_time()).unwrap();

        assert!(first.backup_path.to_string_lossy().ends_with(".20240309_140507"));
        assert!(second.backup_path.to_string_lossy().ends_with(".20240309_140507.1"));
        assert!(third.backup_path.to_string_lossy().ends_with(".20240309_140507.2"));
        assert_eq!(std::fs::read_to_string(&first.backup_path).unwrap(), "1");
        assert_eq!(std::fs::read_to_string(&second.backup_path).unwrap(), "2");
        assert_eq!(std::fs::read_to_string(&third.backup_path).unwrap(), "3");
    }

    #[test]
    fn move_removes_original() {
        let f = fixture();
        let key = f.home.join("id_ed25519");
        std::fs::write(&key, "secret").unwrap();

        let rec = f.store.backup(&key, BackupMode::Move).unwrap();

        assert!(!key.exists());
        assert_eq!(std::fs::read_to_string(rec.backup_path).unwrap(), "secret");
    }

    #[test]
    fn directories_are_copied_recursively() {
        let f = fixture();
        let nvim = f.home.join(".config/nvim");
        std::fs::create_dir_all(nvim.join("lua")).unwrap();
        std::fs::write(nvim.join("lua/plugins.lua"), "p").unwrap();

        let rec = f.store.backup_at(&nvim, BackupMode::Copy, fixed_time()).unwrap();

        assert!(rec.was_directory);
        assert_eq!(
            std::fs::read_to_string(rec.backup_path.join("lua/plugins.lua")).unwrap(),
            "p"
        );
    }

    #[cfg(unix)]
    #[test]
    fn links_are_backed_up_as_links() {
        let f = fixture();
        let target = f.home.join("elsewhere");
        std::fs::write(&target, "referent").unwrap();
        let link = f.home.join(".tmux.conf");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let rec = f.store.backup_at(&link, BackupMode::Copy, fixed_time()).unwrap();

        let meta = rec.backup_path.symlink_metadata().unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(std::fs::read_link(&rec.backup_path).unwrap(), target);
    }

    #[cfg(unix)]
    #[test]
    fn root_is_private() {
        use std::os::unix::fs::PermissionsExt as _;
        let f = fixture();
        let zshrc = f.home.join(".zshrc");
        std::fs::write(&zshrc, "X").unwrap();
        f.store.backup(&zshrc, BackupMode::Copy).unwrap();
        let mode = std::fs::metadata(f.store.root()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn paths_outside_home_use_file_name() {
        let f = fixture();
        let other = tempfile::tempdir().unwrap();
        let file = other.path().join("config.toml");
        std::fs::write(&file, "t").unwrap();
        let rec = f.store.backup_at(&file, BackupMode::Copy, fixed_time()).unwrap();
        assert_eq!(
            rec.backup_path.file_name().unwrap(),
            "config.toml.20240309_140507"
        );
    }

    #[test]
    fn missing_path_is_an_error() {
        let f = fixture();
        let err = f
            .store
            .backup(&f.home.join(".nothing"), BackupMode::Copy)
            .unwrap_err();
        assert!(matches!(err, BackupError::NotFound(_)));
    }
}
