//! Run-scoped record of what changed, rendered as the final summary.
//!
//! Components append [`Event`]s as they act. The run classification is derived
//! from those events alone, so the headline can never disagree with the lines
//! above it.
use std::fmt;
use std::fmt::Write as _;

use crate::resources::ResourceChange;
use crate::resources::backup::BackupRecord;

/// Areas of the environment the report tracks separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Feature {
    /// System packages.
    Packages,
    /// Configuration targets.
    Configs,
    /// Terminal theme.
    TerminalTheme,
    /// Generated git identity.
    GitIdentity,
    /// SSH key pair.
    SshKey,
    /// Shell and tmux plugin managers.
    PluginManagers,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Packages => "packages",
            Self::Configs => "configs",
            Self::TerminalTheme => "terminal theme",
            Self::GitIdentity => "git identity",
            Self::SshKey => "ssh key",
            Self::PluginManagers => "plugin managers",
        })
    }
}

/// What happened to a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Installed where nothing existed before.
    Fresh,
    /// Existing state replaced or brought up to date.
    Updated,
    /// Already correct, or deliberately left alone.
    Skipped,
    /// The user declined.
    Cancelled,
    /// A non-critical step failed.
    Failed,
}

impl Change {
    const fn icon(self) -> &'static str {
        match self {
            Self::Fresh | Self::Updated => "✓",
            Self::Skipped => "○",
            Self::Cancelled => "-",
            Self::Failed => "✗",
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fresh => "fresh",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        })
    }
}

impl From<&ResourceChange> for Change {
    fn from(change: &ResourceChange) -> Self {
        match change {
            ResourceChange::Created => Self::Fresh,
            ResourceChange::Updated => Self::Updated,
            ResourceChange::AlreadyCorrect | ResourceChange::Skipped { .. } => Self::Skipped,
        }
    }
}

/// One thing that happened during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Content was moved or copied into the backup directory.
    Backup(BackupRecord),
    /// A feature changed state.
    Feature {
        /// Which feature.
        feature: Feature,
        /// What happened.
        change: Change,
        /// Short qualifier such as a group or package name.
        detail: Option<String>,
    },
}

/// Net effect of the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Something was installed for the first time.
    FirstInstall,
    /// Nothing new, but existing state changed.
    Update,
    /// Nothing changed.
    NoOp,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FirstInstall => "first install",
            Self::Update => "update",
            Self::NoOp => "no changes",
        })
    }
}

/// Events recorded during one run.
#[derive(Debug, Default)]
pub struct RunReport {
    events: Vec<Event>,
}

impl RunReport {
    /// An empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Record a feature change.
    pub fn feature(&mut self, feature: Feature, change: Change, detail: Option<&str>) {
        self.record(Event::Feature {
            feature,
            change,
            detail: detail.map(str::to_string),
        });
    }

    /// All events in recording order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Backups taken so far.
    pub fn backups(&self) -> impl Iterator<Item = &BackupRecord> {
        self.events.iter().filter_map(|e| match e {
            Event::Backup(record) => Some(record),
            Event::Feature { .. } => None,
        })
    }

    /// Whether any recorded change for `feature` matches `change`.
    #[must_use]
    pub fn has(&self, feature: Feature, change: Change) -> bool {
        self.events.iter().any(|e| {
            matches!(e, Event::Feature { feature: f, change: c, .. } if *f == feature && *c == change)
        })
    }

    /// Classify the run from the recorded events.
    #[must_use]
    pub fn classification(&self) -> RunKind {
        let changes = || {
            self.events.iter().filter_map(|e| match e {
                Event::Feature { change, .. } => Some(*change),
                Event::Backup(_) => None,
            })
        };
        if changes().any(|c| c == Change::Fresh) {
            RunKind::FirstInstall
        } else if self.backups().next().is_some() || changes().any(|c| c == Change::Updated) {
            RunKind::Update
        } else {
            RunKind::NoOp
        }
    }

    /// Render the summary.
    ///
    /// Backups come first in the order they were taken, then feature lines
    /// grouped by feature, then the classification.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let backups: Vec<_> = self.backups().collect();
        if !backups.is_empty() {
            out.push_str("backups:\n");
            for b in backups {
                let _ = writeln!(
                    out,
                    "  {} -> {}",
                    b.original_path.display(),
                    b.backup_path.display()
                );
            }
        }

        let mut features: Vec<(Feature, Change, Option<&str>)> = self
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Feature {
                    feature,
                    change,
                    detail,
                } => Some((*feature, *change, detail.as_deref())),
                Event::Backup(_) => None,
            })
            .collect();
        // Stable: keeps recording order within a feature.
        features.sort_by_key(|(feature, _, _)| *feature);
        for (feature, change, detail) in features {
            let _ = write!(out, "{} {feature}: {change}", change.icon());
            if let Some(detail) = detail {
                let _ = write!(out, " ({detail})");
            }
            out.push('\n');
        }

        let _ = write!(out, "result: {}", self.classification());
        out
    }
}
