//! `bootstrap` binary entry point.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use dotfiles_bootstrap::cli::{Cli, Command};
use dotfiles_bootstrap::commands::{self, CommandOutcome, CommandSetup};
use dotfiles_bootstrap::config::RunConfig;
use dotfiles_bootstrap::error::{BootstrapError, EXIT_SUCCESS, exit_code_for};
use dotfiles_bootstrap::exec::SystemExecutor;
use dotfiles_bootstrap::logging::{Logger, init_subscriber};
use dotfiles_bootstrap::prompt::TerminalPrompter;
use dotfiles_bootstrap::resources::deploy::LinkDeployer;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let cli = Cli::parse();

    if matches!(cli.command, Command::Version) {
        commands::version::run();
        return ExitCode::from(EXIT_SUCCESS);
    }

    init_subscriber(cli.verbose, cli.command.name());
    let log = Logger::new(cli.command.name());

    match run(&cli, &log) {
        Ok(CommandOutcome::Completed) => ExitCode::from(EXIT_SUCCESS),
        Ok(CommandOutcome::Cancelled) => {
            log.skip("cancelled by user");
            ExitCode::from(BootstrapError::Cancelled.exit_code())
        }
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn run(cli: &Cli, log: &Logger) -> Result<CommandOutcome> {
    let run = RunConfig::from_cli(&cli.global, cli.verbose, |key| std::env::var(key).ok())?;
    log.debug(&format!("mode: {:?}", run.mode));

    let setup = CommandSetup::init(&run, log)?;
    let executor = SystemExecutor::new(run.verbose);
    let deployer = LinkDeployer::new(&executor, run.root.clone(), run.home.clone());
    let prompter = TerminalPrompter;
    let ctx = setup.context(&run, log, &executor, &deployer, &prompter);

    match &cli.command {
        Command::Install(opts) => commands::install::run(&ctx, opts),
        Command::Link => commands::link::run(&ctx),
        Command::Git => commands::git::run(&ctx),
        Command::Ssh => commands::ssh::run(&ctx),
        Command::Uninstall => commands::uninstall::run(&ctx),
        Command::Version => {
            commands::version::run();
            Ok(CommandOutcome::Completed)
        }
    }
}
