#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `git` and `ssh` commands.
#![cfg(unix)]

mod common;

use common::*;
use dotfiles_bootstrap::commands::{CommandOutcome, git, ssh};
use dotfiles_bootstrap::config::Mode;
use dotfiles_bootstrap::error::{EXIT_FAILURE, ValidationError, exit_code_for};

// ---------------------------------------------------------------------------
// git
// ---------------------------------------------------------------------------

#[test]
fn unattended_git_without_name_fails_and_creates_no_files() {
    let mut env = TestEnv::new(Mode::Unattended);
    env.identity.email = Some("ada@example.com".to_string());
    let before: Vec<_> = std::fs::read_dir(&env.home).unwrap().collect();

    let err = env
        .run(&ScriptedPrompter::default(), git::run)
        .unwrap_err();

    assert!(err.chain().any(|e| e.is::<ValidationError>()));
    assert_eq!(exit_code_for(&err), EXIT_FAILURE);
    assert!(!env.root.join("git/.gitconfig").exists());
    assert!(before.is_empty());
    assert_eq!(std::fs::read_dir(&env.home).unwrap().count(), 0);
}

#[test]
fn unattended_git_renders_links_and_is_idempotent() {
    let mut env = TestEnv::new(Mode::Unattended);
    env.identity.git_name = Some("Ada Lovelace".to_string());
    env.identity.git_email = Some("ada@example.com".to_string());

    let outcome = env
        .run(&ScriptedPrompter::default(), git::run)
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Completed);

    let rendered = std::fs::read_to_string(env.home_path(".gitconfig")).unwrap();
    assert!(rendered.contains("name = Ada Lovelace"));
    assert!(rendered.contains("email = ada@example.com"));

    env.run(&ScriptedPrompter::default(), git::run)
        .unwrap();
    assert!(env.backups().is_empty());
}

#[test]
fn interactive_git_uses_email_fallback_as_default() {
    let mut env = TestEnv::new(Mode::Interactive);
    env.identity.email = Some("ada@example.com".to_string());
    let prompter = ScriptedPrompter::new(vec![
        Reply::Text("Ada".to_string()),
        Reply::Text(String::new()),
    ]);

    env.run(&prompter, git::run).unwrap();

    assert_eq!(prompter.asked().len(), 2);
    let rendered = std::fs::read_to_string(env.root.join("git/.gitconfig")).unwrap();
    assert!(rendered.contains("email = ada@example.com"));
}

// ---------------------------------------------------------------------------
// ssh
// ---------------------------------------------------------------------------

#[test]
fn unattended_ssh_runs_keygen_with_email() {
    let mut env = TestEnv::new(Mode::Unattended);
    env.identity.email = Some("ada@example.com".to_string());

    let outcome = env
        .run(&ScriptedPrompter::default(), ssh::run)
        .unwrap();

    assert_eq!(outcome, CommandOutcome::Completed);
    let calls = env.executor.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("ssh-keygen -q -t ed25519 -C ada@example.com"));
}

#[test]
fn cancelled_ssh_prompt_reports_cancellation() {
    let env = TestEnv::new(Mode::Interactive);
    let outcome = env
        .run(&ScriptedPrompter::default(), ssh::run)
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Cancelled);
    assert!(env.executor.calls().is_empty());
}
