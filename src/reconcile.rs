//! Backup-and-deploy reconciliation of managed targets.
//!
//! For each unit (a single target, or every member of a named group) the
//! reconciler probes the destinations, decides what to do, and then strictly
//! in this order backs up conflicting content, removes it, delegates to the
//! [`Deployer`] and re-probes to verify. Once a unit passes the decision point
//! the original content is always recoverable from the backup directory, even
//! if the deploy step fails afterwards.
use crate::config::targets::{ManagedTarget, TargetKind};
use crate::error::ReconcileError;
use crate::logging::Logger;
use crate::prompt::{Answer, Prompter};
use crate::report::{Change, Event, Feature, RunReport};
use crate::resources::backup::{BackupMode, BackupRecord, BackupStore};
use crate::resources::deploy::Deployer;
use crate::resources::destination::{DestinationState, probe};
use crate::resources::helpers::fs::remove_path;

/// How destinations holding other content are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Ask before replacing each conflicting destination.
    Ask,
    /// Back up and replace without asking.
    Replace,
}

/// What to do with one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Already points at the source; nothing to do.
    AlreadyLinked,
    /// Nothing there; deploy without a backup.
    Deploy,
    /// Back up, remove and deploy.
    Replace,
    /// Ask first, then behave like [`Decision::Replace`].
    ConfirmReplace,
}

/// Decide what to do with a destination in `state`.
///
/// A foreign link is treated like regular content: the link itself is backed
/// up and removed, never the file it points to.
#[must_use]
pub const fn decide(state: &DestinationState, policy: OverwritePolicy) -> Decision {
    match (state, policy) {
        (DestinationState::ManagedLink, _) => Decision::AlreadyLinked,
        (DestinationState::Absent, _) => Decision::Deploy,
        (
            DestinationState::RegularContent { .. } | DestinationState::ForeignLink { .. },
            OverwritePolicy::Replace,
        ) => Decision::Replace,
        (
            DestinationState::RegularContent { .. } | DestinationState::ForeignLink { .. },
            OverwritePolicy::Ask,
        ) => Decision::ConfirmReplace,
    }
}

/// Result of reconciling one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was done.
    Skipped(String),
    /// The unit was deployed, after taking these backups.
    Deployed {
        /// Backups taken before deploying, one per replaced destination.
        backups: Vec<BackupRecord>,
    },
    /// The user declined; nothing was touched.
    Cancelled,
}

impl Outcome {
    /// The report entry for this outcome.
    #[must_use]
    pub fn change(&self) -> Change {
        match self {
            Self::Skipped(_) => Change::Skipped,
            Self::Deployed { backups } if backups.is_empty() => Change::Fresh,
            Self::Deployed { .. } => Change::Updated,
            Self::Cancelled => Change::Cancelled,
        }
    }
}

/// Split `targets` into deploy units.
///
/// Members of the same named group form one unit, placed where the group
/// first appears. Every other target is a unit of its own.
#[must_use]
pub fn units(targets: &[ManagedTarget]) -> Vec<Vec<&ManagedTarget>> {
    let mut units: Vec<Vec<&ManagedTarget>> = Vec::new();
    for target in targets {
        let existing = target.kind.group().and_then(|group| {
            units
                .iter_mut()
                .find(|unit| unit.first().and_then(|t| t.kind.group()) == Some(group))
        });
        match existing {
            Some(unit) => unit.push(target),
            None => units.push(vec![target]),
        }
    }
    units
}

/// Group name for a group unit, destination path otherwise.
#[must_use]
pub fn unit_label(unit: &[&ManagedTarget]) -> String {
    match unit.first() {
        Some(ManagedTarget {
            kind: TargetKind::NamedGroup(group),
            ..
        }) => group.clone(),
        Some(target) => target.destination.display().to_string(),
        None => String::new(),
    }
}

/// Drives targets to the linked state.
pub struct Reconciler<'a> {
    policy: OverwritePolicy,
    store: &'a BackupStore,
    deployer: &'a dyn Deployer,
    prompter: &'a dyn Prompter,
    log: &'a Logger,
}

impl std::fmt::Debug for Reconciler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("policy", &self.policy)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler.
    #[must_use]
    pub const fn new(
        policy: OverwritePolicy,
        store: &'a BackupStore,
        deployer: &'a dyn Deployer,
        prompter: &'a dyn Prompter,
        log: &'a Logger,
    ) -> Self {
        Self {
            policy,
            store,
            deployer,
            prompter,
            log,
        }
    }

    /// Reconcile a single target.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] on a missing source, probe, backup, removal,
    /// deploy or verification failure.
    pub fn reconcile(&self, target: &ManagedTarget) -> Result<Outcome, ReconcileError> {
        self.reconcile_unit(&[target])
    }

    /// Reconcile every member of one deploy unit together.
    ///
    /// The deployer is called once for the whole unit.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] on a missing source, probe, backup, removal,
    /// deploy or verification failure. Earlier steps are not rolled back.
    pub fn reconcile_unit(&self, unit: &[&ManagedTarget]) -> Result<Outcome, ReconcileError> {
        let label = unit_label(unit);
        let Some(first) = unit.first() else {
            return Ok(Outcome::Skipped("nothing to deploy".to_string()));
        };

        if let Some(missing) = unit.iter().find(|t| t.source.symlink_metadata().is_err()) {
            return Err(ReconcileError::MissingSource(missing.source.clone()));
        }

        let mut plan = Vec::with_capacity(unit.len());
        for target in unit {
            let state = probe(target)?;
            let decision = decide(&state, self.policy);
            self.log
                .debug(&format!("{}: {state} -> {decision:?}", target.destination.display()));
            plan.push((*target, state, decision));
        }

        if plan
            .iter()
            .all(|(_, _, d)| *d == Decision::AlreadyLinked)
        {
            self.log.skip(&format!("{label}: already linked"));
            return Ok(Outcome::Skipped("already linked".to_string()));
        }

        for (target, state, decision) in &plan {
            if *decision != Decision::ConfirmReplace {
                continue;
            }
            let question = format!(
                "{} exists ({state}). Back it up and replace it?",
                target.destination.display()
            );
            let answer = self
                .prompter
                .confirm(&question, false)
                .map_err(|e| ReconcileError::Prompt {
                    path: target.destination.clone(),
                    source: e.into(),
                })?;
            if answer != Answer::Given(true) {
                self.log.skip(&format!("{label}: left unchanged"));
                return Ok(Outcome::Cancelled);
            }
        }

        let mut backups = Vec::new();
        for (target, _, decision) in &plan {
            if !matches!(decision, Decision::Replace | Decision::ConfirmReplace) {
                continue;
            }
            let record = self.store.backup(&target.destination, BackupMode::Copy)?;
            self.log.info(&format!(
                "backed up {} -> {}",
                record.original_path.display(),
                record.backup_path.display()
            ));
            remove_path(&target.destination).map_err(|source| ReconcileError::Remove {
                path: target.destination.clone(),
                source,
            })?;
            backups.push(record);
        }

        self.deployer
            .deploy(first)
            .map_err(|e| ReconcileError::Deploy {
                target: label.clone(),
                source: e.into(),
            })?;

        for (target, _, _) in &plan {
            let found = probe(target)?;
            if found != DestinationState::ManagedLink {
                return Err(ReconcileError::Verification {
                    path: target.destination.clone(),
                    found,
                });
            }
        }

        self.log.success(&format!("{label}: linked"));
        Ok(Outcome::Deployed { backups })
    }

    /// Reconcile every unit of `targets` in order, recording each outcome and
    /// backup under `feature`.
    ///
    /// A declined unit does not stop the remaining units.
    ///
    /// # Errors
    ///
    /// Stops at the first [`ReconcileError`]; units already deployed stay
    /// deployed and their events stay recorded.
    pub fn reconcile_all(
        &self,
        targets: &[ManagedTarget],
        feature: Feature,
        report: &mut RunReport,
    ) -> Result<Vec<Outcome>, ReconcileError> {
        let mut outcomes = Vec::new();
        for unit in units(targets) {
            let outcome = self.reconcile_unit(&unit)?;
            if let Outcome::Deployed { backups } = &outcome {
                for record in backups {
                    report.record(Event::Backup(record.clone()));
                }
            }
            report.feature(feature, outcome.change(), Some(&unit_label(&unit)));
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
#[cfg(unix)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::prompt::test_helpers::{Reply, ScriptedPrompter};
    use crate::resources::deploy::MockDeployer;
    use crate::resources::symlink::SymlinkDeployer;
    use std::path::{Path, PathBuf};

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        home: PathBuf,
        store: BackupStore,
        log: Logger,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dots");
        let home = dir.path().join("home");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&home).unwrap();
        let store = BackupStore::new(home.join(".dotfiles-backup"), home.clone());
        Fixture {
            _dir: dir,
            root,
            home,
            store,
            log: Logger::default(),
        }
    }

    impl Fixture {
        fn file_target(&self, name: &str, content: &str) -> ManagedTarget {
            let source = self.root.join(name);
            std::fs::write(&source, content).unwrap();
            ManagedTarget::link(source, self.home.join(name))
        }

        fn reconciler<'a>(
            &'a self,
            policy: OverwritePolicy,
            deployer: &'a dyn Deployer,
            prompter: &'a dyn Prompter,
        ) -> Reconciler<'a> {
            Reconciler::new(policy, &self.store, deployer, prompter, &self.log)
        }
    }

    fn backup_entries(store: &BackupStore) -> Vec<PathBuf> {
        match std::fs::read_dir(store.root()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // decision table
    // ------------------------------------------------------------------

    #[test]
    fn decision_table() {
        use DestinationState as S;
        let file = S::RegularContent { is_dir: false };
        let foreign = S::ForeignLink {
            points_to: PathBuf::from("/elsewhere"),
        };
        for policy in [OverwritePolicy::Ask, OverwritePolicy::Replace] {
            assert_eq!(decide(&S::ManagedLink, policy), Decision::AlreadyLinked);
            assert_eq!(decide(&S::Absent, policy), Decision::Deploy);
        }
        assert_eq!(decide(&file, OverwritePolicy::Replace), Decision::Replace);
        assert_eq!(decide(&file, OverwritePolicy::Ask), Decision::ConfirmReplace);
        assert_eq!(decide(&foreign, OverwritePolicy::Replace), Decision::Replace);
        assert_eq!(decide(&foreign, OverwritePolicy::Ask), Decision::ConfirmReplace);
    }

    // ------------------------------------------------------------------
    // units
    // ------------------------------------------------------------------

    #[test]
    fn group_members_share_a_unit() {
        let root = Path::new("/dots");
        let home = Path::new("/home/u");
        let targets = vec![
            ManagedTarget::group_member(root, home, "zsh", ".zshrc"),
            ManagedTarget::group_member(root, home, "tmux", ".tmux.conf"),
            ManagedTarget::group_member(root, home, "zsh", ".zprofile"),
            ManagedTarget::link(PathBuf::from("/dots/bin/x"), PathBuf::from("/home/u/bin/x")),
        ];
        let units = units(&targets);
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].len(), 2);
        assert_eq!(unit_label(&units[0]), "zsh");
        assert_eq!(unit_label(&units[1]), "tmux");
        assert_eq!(unit_label(&units[2]), "/home/u/bin/x");
    }

    // ------------------------------------------------------------------
    // reconcile
    // ------------------------------------------------------------------

    #[test]
    fn absent_destination_is_deployed_without_backup() {
        let fx = fixture();
        let target = fx.file_target(".zshrc", "managed");
        let prompter = ScriptedPrompter::default();
        let outcome = fx
            .reconciler(OverwritePolicy::Ask, &SymlinkDeployer, &prompter)
            .reconcile(&target)
            .unwrap();
        assert_eq!(outcome, Outcome::Deployed { backups: vec![] });
        assert_eq!(outcome.change(), Change::Fresh);
        assert!(prompter.asked().is_empty());
        assert!(backup_entries(&fx.store).is_empty());
    }

    #[test]
    fn regular_file_is_backed_up_then_replaced() {
        let fx = fixture();
        let target = fx.file_target(".zshrc", "managed");
        std::fs::write(&target.destination, "mine").unwrap();
        let prompter = ScriptedPrompter::default();

        let outcome = fx
            .reconciler(OverwritePolicy::Replace, &SymlinkDeployer, &prompter)
            .reconcile(&target)
            .unwrap();

        let Outcome::Deployed { backups } = outcome else {
            panic!("expected deploy, got {outcome:?}");
        };
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read_to_string(&backups[0].backup_path).unwrap(), "mine");
        assert_eq!(probe(&target).unwrap(), DestinationState::ManagedLink);
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn rerun_is_skipped_without_io() {
        let fx = fixture();
        let target = fx.file_target(".zshrc", "managed");
        let prompter = ScriptedPrompter::default();
        let r = fx.reconciler(OverwritePolicy::Ask, &SymlinkDeployer, &prompter);
        r.reconcile(&target).unwrap();

        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().never();
        let outcome = fx
            .reconciler(OverwritePolicy::Ask, &deployer, &prompter)
            .reconcile(&target)
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped(_)));
    }

    #[test]
    fn declined_confirmation_touches_nothing() {
        let fx = fixture();
        let target = fx.file_target(".zshrc", "managed");
        std::fs::write(&target.destination, "mine").unwrap();
        let prompter = ScriptedPrompter::new(vec![Reply::Yes(false)]);
        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().never();

        let outcome = fx
            .reconciler(OverwritePolicy::Ask, &deployer, &prompter)
            .reconcile(&target)
            .unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(std::fs::read_to_string(&target.destination).unwrap(), "mine");
        assert!(backup_entries(&fx.store).is_empty());
        assert_eq!(prompter.asked().len(), 1);
    }

    #[test]
    fn aborted_prompt_is_a_cancellation() {
        let fx = fixture();
        let target = fx.file_target(".zshrc", "managed");
        std::fs::write(&target.destination, "mine").unwrap();
        let prompter = ScriptedPrompter::new(vec![Reply::Cancel]);
        let outcome = fx
            .reconciler(OverwritePolicy::Ask, &SymlinkDeployer, &prompter)
            .reconcile(&target)
            .unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(std::fs::read_to_string(&target.destination).unwrap(), "mine");
    }

    #[test]
    fn confirmed_replacement_backs_up() {
        let fx = fixture();
        let target = fx.file_target(".zshrc", "managed");
        std::fs::write(&target.destination, "mine").unwrap();
        let prompter = ScriptedPrompter::new(vec![Reply::Yes(true)]);
        let outcome = fx
            .reconciler(OverwritePolicy::Ask, &SymlinkDeployer, &prompter)
            .reconcile(&target)
            .unwrap();
        assert_eq!(outcome.change(), Change::Updated);
        assert_eq!(backup_entries(&fx.store).len(), 1);
    }

    #[test]
    fn foreign_link_is_backed_up_not_its_referent() {
        let fx = fixture();
        let target = fx.file_target(".zshrc", "managed");
        let elsewhere = fx.home.join("elsewhere");
        std::fs::write(&elsewhere, "keep me").unwrap();
        std::os::unix::fs::symlink(&elsewhere, &target.destination).unwrap();
        let prompter = ScriptedPrompter::default();

        let outcome = fx
            .reconciler(OverwritePolicy::Replace, &SymlinkDeployer, &prompter)
            .reconcile(&target)
            .unwrap();

        let Outcome::Deployed { backups } = outcome else {
            panic!("expected deploy");
        };
        let saved = &backups[0].backup_path;
        assert!(saved.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_link(saved).unwrap(), elsewhere);
        assert_eq!(std::fs::read_to_string(&elsewhere).unwrap(), "keep me");
    }

    #[test]
    fn missing_source_fails_before_any_mutation() {
        let fx = fixture();
        let target = ManagedTarget::link(fx.root.join("missing"), fx.home.join(".zshrc"));
        std::fs::write(&target.destination, "mine").unwrap();
        let prompter = ScriptedPrompter::default();
        let err = fx
            .reconciler(OverwritePolicy::Replace, &SymlinkDeployer, &prompter)
            .reconcile(&target)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::MissingSource(_)));
        assert_eq!(std::fs::read_to_string(&target.destination).unwrap(), "mine");
    }

    #[test]
    fn failed_deploy_leaves_backup_in_place() {
        let fx = fixture();
        let target = fx.file_target(".zshrc", "managed");
        std::fs::write(&target.destination, "mine").unwrap();
        let mut deployer = MockDeployer::new();
        deployer
            .expect_deploy()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("stow conflict")));
        let prompter = ScriptedPrompter::default();

        let err = fx
            .reconciler(OverwritePolicy::Replace, &deployer, &prompter)
            .reconcile(&target)
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Deploy { .. }));
        let saved = backup_entries(&fx.store);
        assert_eq!(saved.len(), 1);
        assert_eq!(std::fs::read_to_string(&saved[0]).unwrap(), "mine");
    }

    #[test]
    fn deploy_that_links_nothing_fails_verification() {
        let fx = fixture();
        let target = fx.file_target(".zshrc", "managed");
        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().times(1).returning(|_| Ok(()));
        let prompter = ScriptedPrompter::default();

        let err = fx
            .reconciler(OverwritePolicy::Replace, &deployer, &prompter)
            .reconcile(&target)
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Verification {
                found: DestinationState::Absent,
                ..
            }
        ));
    }

    #[test]
    fn group_is_deployed_once() {
        let fx = fixture();
        std::fs::create_dir_all(fx.root.join("zsh")).unwrap();
        std::fs::write(fx.root.join("zsh/.zshrc"), "rc").unwrap();
        std::fs::write(fx.root.join("zsh/.zprofile"), "profile").unwrap();
        let targets = vec![
            ManagedTarget::group_member(&fx.root, &fx.home, "zsh", ".zshrc"),
            ManagedTarget::group_member(&fx.root, &fx.home, "zsh", ".zprofile"),
        ];
        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().times(1).returning(|t| {
            let group_dir = t.source.parent().unwrap();
            let home = t.destination.parent().unwrap();
            for name in [".zshrc", ".zprofile"] {
                std::os::unix::fs::symlink(group_dir.join(name), home.join(name)).unwrap();
            }
            Ok(())
        });
        let prompter = ScriptedPrompter::default();
        let mut report = RunReport::new();

        let outcomes = fx
            .reconciler(OverwritePolicy::Replace, &deployer, &prompter)
            .reconcile_all(&targets, Feature::Configs, &mut report)
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(report.has(Feature::Configs, Change::Fresh));
    }

    #[test]
    fn reconcile_all_records_backups_and_continues_after_decline() {
        let fx = fixture();
        let first = fx.file_target(".zshrc", "managed");
        let second = fx.file_target(".tmux.conf", "managed");
        std::fs::write(&first.destination, "mine").unwrap();
        std::fs::write(&second.destination, "mine too").unwrap();
        let prompter = ScriptedPrompter::new(vec![Reply::Yes(false), Reply::Yes(true)]);
        let mut report = RunReport::new();

        let outcomes = fx
            .reconciler(OverwritePolicy::Ask, &SymlinkDeployer, &prompter)
            .reconcile_all(&[first, second], Feature::Configs, &mut report)
            .unwrap();

        assert_eq!(outcomes[0], Outcome::Cancelled);
        assert_eq!(outcomes[1].change(), Change::Updated);
        assert_eq!(report.backups().count(), 1);
        assert!(report.has(Feature::Configs, Change::Cancelled));
    }
}
