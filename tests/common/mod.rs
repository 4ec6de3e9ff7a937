// Shared helpers for integration tests.
//
// Provides a temporary dotfiles checkout and home directory plus scripted
// collaborators, so each integration test can drive a command end to end
// without touching the real home directory or running external programs.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dotfiles_bootstrap::commands::CommandSetup;
use dotfiles_bootstrap::config::identity::IdentityInputs;
use dotfiles_bootstrap::config::{Mode, RunConfig};
use dotfiles_bootstrap::exec::{ExecResult, Executor};
use dotfiles_bootstrap::logging::Logger;
use dotfiles_bootstrap::prompt::{Answer, Prompter};
use dotfiles_bootstrap::resources::symlink::SymlinkDeployer;
use dotfiles_bootstrap::tasks::Context;

/// Template shipped in every test repository.
pub const GIT_TEMPLATE: &str =
    "[user]\n\tname = __GIT_USER_NAME__\n\temail = __GIT_USER_EMAIL__\n";

/// Settings linking `zsh/.zshrc` directly, with nothing to install.
const SETTINGS: &str = r#"
plugins = []
targets = [{ source = "zsh/.zshrc", destination = ".zshrc" }]

[packages]
core = []
optional = []
"#;

/// Write the minimal repository the bootstrap engine expects into `root`.
///
/// Creates:
/// - `bootstrap.toml`              (one direct link, no packages or plugins)
/// - `zsh/.zshrc`
/// - `git/.gitconfig.template`
pub fn setup_minimal_repo(root: &Path) {
    std::fs::create_dir_all(root.join("zsh")).expect("create zsh dir");
    std::fs::create_dir_all(root.join("git")).expect("create git dir");
    std::fs::write(root.join("bootstrap.toml"), SETTINGS).expect("write settings");
    std::fs::write(root.join("zsh/.zshrc"), "# managed zshrc\n").expect("write zshrc");
    std::fs::write(root.join("git/.gitconfig.template"), GIT_TEMPLATE).expect("write template");
}

// ---------------------------------------------------------------------------
// Scripted collaborators
// ---------------------------------------------------------------------------

/// A scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer a confirmation.
    Yes(bool),
    /// Answer a text or secret prompt.
    Text(String),
    /// Abort the prompt.
    Cancel,
}

/// Prompter replaying fixed answers; running out of answers cancels.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    replies: Mutex<VecDeque<Reply>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    fn next(&self, question: &str) -> Reply {
        self.asked.lock().unwrap().push(question.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Cancel)
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str, _default: bool) -> anyhow::Result<Answer<bool>> {
        Ok(match self.next(question) {
            Reply::Yes(b) => Answer::Given(b),
            Reply::Text(_) | Reply::Cancel => Answer::Cancelled,
        })
    }

    fn text(&self, question: &str, default: Option<&str>) -> anyhow::Result<Answer<String>> {
        Ok(match self.next(question) {
            Reply::Text(t) if t.is_empty() => Answer::Given(default.unwrap_or_default().to_string()),
            Reply::Text(t) => Answer::Given(t),
            Reply::Yes(_) | Reply::Cancel => Answer::Cancelled,
        })
    }

    fn secret(&self, question: &str) -> anyhow::Result<Answer<String>> {
        Ok(match self.next(question) {
            Reply::Text(t) => Answer::Given(t),
            Reply::Yes(_) | Reply::Cancel => Answer::Cancelled,
        })
    }
}

/// Executor that records every command and reports success.
///
/// `which` always answers `false`, so no clipboard tool or package manager is
/// ever found.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, program: &str, args: &[&str]) -> ExecResult {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().unwrap().push(line);
        ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        Ok(self.record(program, args))
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        Ok(self.record(program, args))
    }

    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        _input: &str,
    ) -> anyhow::Result<ExecResult> {
        Ok(self.record(program, args))
    }

    fn which(&self, _program: &str) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Test environment
// ---------------------------------------------------------------------------

/// An isolated checkout and home directory backed by a [`tempfile::TempDir`].
///
/// `root` and `home` are siblings, so relative links from the home directory
/// reach the checkout through `../dots`.
#[derive(Debug)]
pub struct TestEnv {
    _dir: tempfile::TempDir,
    /// Repository root.
    pub root: PathBuf,
    /// Home directory.
    pub home: PathBuf,
    /// Interactive or unattended.
    pub mode: Mode,
    /// Identity inputs as if read from flags and environment.
    pub identity: IdentityInputs,
    /// Executor shared by every run of this environment.
    pub executor: RecordingExecutor,
}

impl TestEnv {
    /// A fresh environment in `mode` with an empty home directory.
    pub fn new(mode: Mode) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path().join("dots");
        let home = dir.path().join("home");
        setup_minimal_repo(&root);
        std::fs::create_dir_all(&home).expect("create home");
        Self {
            _dir: dir,
            root,
            home,
            mode,
            identity: IdentityInputs::default(),
            executor: RecordingExecutor::default(),
        }
    }

    /// The run configuration a command would see.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            mode: self.mode,
            verbose: false,
            skip_confirmation: false,
            root: self.root.clone(),
            home: self.home.clone(),
            identity: self.identity.clone(),
            agent_available: false,
        }
    }

    /// Build a context from the on-disk settings and hand it to `f`.
    pub fn run<R>(&self, prompter: &ScriptedPrompter, f: impl FnOnce(&Context) -> R) -> R {
        let run = self.run_config();
        let log = Logger::default();
        let setup = CommandSetup::init(&run, &log).expect("load settings");
        let ctx = setup.context(&run, &log, &self.executor, &SymlinkDeployer, prompter);
        f(&ctx)
    }

    /// Backup directory used by every run.
    pub fn backup_dir(&self) -> PathBuf {
        self.home.join(".dotfiles-backup")
    }

    /// Backups taken so far, sorted by name.
    pub fn backups(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.backup_dir()) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries.map(|e| e.unwrap().path()).collect();
        paths.sort();
        paths
    }

    /// `home/<rel>`.
    pub fn home_path(&self, rel: &str) -> PathBuf {
        self.home.join(rel)
    }
}
