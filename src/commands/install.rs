//! Command: run every install step.
use anyhow::Result;

use super::{CommandOutcome, run_tasks_to_completion};
use crate::cli::InstallOpts;
use crate::tasks::{self, Context, Task};

/// Run the install command.
///
/// A cancelled step is treated as skipped; the install as a whole only fails
/// on a critical or configuration error.
///
/// # Errors
///
/// Returns an error if a configured source is missing or a critical task
/// fails.
pub fn run(ctx: &Context, opts: &InstallOpts) -> Result<CommandOutcome> {
    ctx.log.info(&format!("bootstrap {}", super::version::version()));
    ctx.registry.validate()?;

    let all_tasks = tasks::all_install_tasks();
    let selected = select(&all_tasks, opts);
    if selected.len() < all_tasks.len() {
        let names: Vec<&str> = selected.iter().map(|t| t.name()).collect();
        ctx.log.debug(&format!("selected steps: {}", names.join(", ")));
    }

    run_tasks_to_completion(selected, ctx)?;
    Ok(CommandOutcome::Completed)
}

/// Filter by `--only` (takes precedence) or `--skip`, matching task names
/// case-insensitively by substring.
fn select<'a>(all: &'a [Box<dyn Task>], opts: &InstallOpts) -> Vec<&'a dyn Task> {
    all.iter()
        .filter(|t| {
            let name = t.name().to_lowercase();
            if !opts.only.is_empty() {
                return opts.only.iter().any(|o| name.contains(&o.to_lowercase()));
            }
            !opts.skip.iter().any(|s| name.contains(&s.to_lowercase()))
        })
        .map(AsRef::as_ref)
        .collect()
}

#[cfg(test)]
#[cfg(unix)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::error::ConfigError;
    use crate::prompt::test_helpers::Reply;
    use crate::tasks::test_helpers::Fixture;

    fn names(opts: &InstallOpts) -> Vec<&'static str> {
        let all = tasks::all_install_tasks();
        select(&all, opts).iter().map(|t| t.name()).collect()
    }

    #[test]
    fn no_filter_keeps_every_step() {
        assert_eq!(
            names(&InstallOpts::default()),
            vec![
                "Install core packages",
                "Install optional packages",
                "Deploy configs",
                "Deploy terminal theme",
                "Install plugin managers",
                "Configure git identity",
                "Generate SSH key",
            ]
        );
    }

    #[test]
    fn skip_matches_by_substring() {
        let opts = InstallOpts {
            skip: vec!["PACKAGES".to_string(), "ssh".to_string()],
            only: vec![],
        };
        let selected = names(&opts);
        assert!(!selected.iter().any(|n| n.contains("packages")));
        assert!(!selected.contains(&"Generate SSH key"));
        assert!(selected.contains(&"Deploy configs"));
    }

    #[test]
    fn only_wins_over_skip() {
        let opts = InstallOpts {
            skip: vec!["configs".to_string()],
            only: vec!["configs".to_string()],
        };
        assert_eq!(names(&opts), vec!["Deploy configs"]);
    }

    #[test]
    fn missing_source_fails_before_anything_is_linked() {
        let mut fx = Fixture::new(Mode::Unattended);
        fx.settings.targets.push(crate::config::settings::TargetEntry::Link {
            source: "nope/.nope".to_string(),
            destination: ".nope".to_string(),
        });
        fx.refresh_registry();

        let err = run(&fx.ctx(), &InstallOpts::default()).unwrap_err();

        assert!(err.chain().any(|e| e.is::<ConfigError>()));
        assert!(fx.home.join(".zshrc").symlink_metadata().is_err());
        assert_eq!(fx.executor.call_count(), 0);
    }

    #[test]
    fn declined_step_does_not_cancel_the_install() {
        let fx = Fixture::new(Mode::Interactive).with_replies(vec![Reply::Yes(false)]);
        std::fs::write(fx.home.join(".zshrc"), "mine").unwrap();
        let opts = InstallOpts {
            skip: vec![],
            only: vec!["configs".to_string()],
        };
        assert_eq!(run(&fx.ctx(), &opts).unwrap(), CommandOutcome::Completed);
        assert_eq!(
            std::fs::read_to_string(fx.home.join(".zshrc")).unwrap(),
            "mine"
        );
    }
}
