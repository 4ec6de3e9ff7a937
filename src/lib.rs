//! Personal environment bootstrap engine.
//!
//! Installs packages, links configuration files from a dotfiles checkout into
//! the home directory, renders the git identity and generates an SSH key.
//! Every run is idempotent: existing content is backed up before it is
//! replaced, and a rerun on an already bootstrapped machine changes nothing.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: flags, environment and `bootstrap.toml` folded into a [`config::RunConfig`]
//! - **[`resources`]**: probe, back up and deploy primitives
//! - **[`tasks`]**: named steps that reconcile targets and record a [`report::RunReport`]
//! - **[`commands`]**: subcommand orchestration (`install`, `link`, `git`, `ssh`, `uninstall`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod prompt;
pub mod reconcile;
pub mod report;
pub mod resources;
pub mod tasks;
