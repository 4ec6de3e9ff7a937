//! Task: render the git identity from its template.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::config::identity::resolve_git_identity;
use crate::prompt::Answer;
use crate::reconcile::Outcome;
use crate::report::{Change, Event, Feature, RunReport};
use crate::resources::ResourceChange;
use crate::resources::git_identity::write_config;

/// Render `.gitconfig` from its template and link the `git` group.
#[derive(Debug)]
pub struct ConfigureGitIdentity {
    required: bool,
}

impl ConfigureGitIdentity {
    /// Always run; missing input fails in unattended mode.
    #[must_use]
    pub const fn required() -> Self {
        Self { required: true }
    }

    /// Run when a prompt is possible or the identity was supplied.
    #[must_use]
    pub const fn when_available() -> Self {
        Self { required: false }
    }
}

impl Task for ConfigureGitIdentity {
    fn name(&self) -> &'static str {
        "Configure git identity"
    }

    fn feature(&self) -> Feature {
        Feature::GitIdentity
    }

    fn critical(&self) -> bool {
        self.required
    }

    fn should_run(&self, ctx: &Context) -> bool {
        self.required || ctx.run.is_interactive() || ctx.run.identity.has_git_identity()
    }

    fn run(&self, ctx: &Context, report: &mut RunReport) -> Result<TaskResult> {
        ctx.registry.validate_git_template()?;

        let Answer::Given(identity) = resolve_git_identity(ctx.run, ctx.prompter, ctx.log)? else {
            report.feature(Feature::GitIdentity, Change::Cancelled, None);
            return Ok(TaskResult::Cancelled);
        };
        ctx.log
            .debug(&format!("git identity: {} <{}>", identity.name, identity.email));

        let output = &ctx.registry.git.source;
        let rendered = write_config(&ctx.registry.git_template, output, &identity)?;
        if rendered == ResourceChange::AlreadyCorrect {
            ctx.log.debug("gitconfig unchanged");
        } else {
            ctx.log.success(&format!("rendered {}", output.display()));
        }

        let outcome = ctx.reconciler().reconcile(&ctx.registry.git)?;
        let change = match &outcome {
            Outcome::Cancelled => Change::Cancelled,
            Outcome::Deployed { backups } => {
                for record in backups {
                    report.record(Event::Backup(record.clone()));
                }
                if rendered == ResourceChange::Created && backups.is_empty() {
                    Change::Fresh
                } else {
                    Change::Updated
                }
            }
            Outcome::Skipped(_) => match rendered {
                ResourceChange::Created => Change::Fresh,
                ResourceChange::Updated => Change::Updated,
                ResourceChange::AlreadyCorrect | ResourceChange::Skipped { .. } => Change::Skipped,
            },
        };
        let detail = format!("{} <{}>", identity.name, identity.email);
        report.feature(Feature::GitIdentity, change, Some(&detail));

        Ok(match change {
            Change::Cancelled => TaskResult::Cancelled,
            Change::Skipped => TaskResult::Skipped("git identity unchanged".to_string()),
            Change::Fresh | Change::Updated | Change::Failed => TaskResult::Ok,
        })
    }
}

#[cfg(test)]
#[cfg(unix)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::error::{ConfigError, ValidationError};
    use crate::prompt::test_helpers::Reply;
    use crate::resources::destination::{DestinationState, probe};
    use crate::tasks::test_helpers::Fixture;

    fn unattended_with(name: Option<&str>, email: Option<&str>) -> Fixture {
        let mut fx = Fixture::new(Mode::Unattended);
        fx.run.identity.git_name = name.map(str::to_string);
        fx.run.identity.email = email.map(str::to_string);
        fx
    }

    #[test]
    fn unattended_without_name_fails_and_writes_nothing() {
        let fx = unattended_with(None, Some("ada@example.com"));
        let mut report = RunReport::new();
        let err = ConfigureGitIdentity::required()
            .run(&fx.ctx(), &mut report)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::Missing { .. })
        ));
        assert!(!fx.registry.git.source.exists());
        assert!(!fx.home.join(".gitconfig").exists());
        assert!(report.events().is_empty());
    }

    #[test]
    fn unattended_renders_and_links() {
        let fx = unattended_with(Some("Ada Lovelace"), Some("ada@example.com"));
        let mut report = RunReport::new();
        let result = ConfigureGitIdentity::required()
            .run(&fx.ctx(), &mut report)
            .unwrap();
        assert_eq!(result, TaskResult::Ok);

        let rendered = std::fs::read_to_string(&fx.registry.git.source).unwrap();
        assert!(rendered.contains("name = Ada Lovelace"));
        assert!(rendered.contains("email = ada@example.com"));
        assert_eq!(probe(&fx.registry.git).unwrap(), DestinationState::ManagedLink);
        assert!(report.has(Feature::GitIdentity, Change::Fresh));
    }

    #[test]
    fn rerun_with_same_identity_is_skipped() {
        let fx = unattended_with(Some("Ada"), Some("ada@example.com"));
        ConfigureGitIdentity::required()
            .run(&fx.ctx(), &mut RunReport::new())
            .unwrap();
        let mut report = RunReport::new();
        let result = ConfigureGitIdentity::required()
            .run(&fx.ctx(), &mut report)
            .unwrap();
        assert!(matches!(result, TaskResult::Skipped(_)));
        assert!(report.has(Feature::GitIdentity, Change::Skipped));
    }

    #[test]
    fn changed_identity_is_an_update() {
        let mut fx = unattended_with(Some("Ada"), Some("ada@example.com"));
        ConfigureGitIdentity::required()
            .run(&fx.ctx(), &mut RunReport::new())
            .unwrap();
        fx.run.identity.git_name = Some("Grace".to_string());
        let mut report = RunReport::new();
        ConfigureGitIdentity::required()
            .run(&fx.ctx(), &mut report)
            .unwrap();
        assert!(report.has(Feature::GitIdentity, Change::Updated));
    }

    #[test]
    fn interactive_prompts_and_can_cancel() {
        let fx = Fixture::new(Mode::Interactive).with_replies(vec![Reply::Cancel]);
        let mut report = RunReport::new();
        let result = ConfigureGitIdentity::required()
            .run(&fx.ctx(), &mut report)
            .unwrap();
        assert_eq!(result, TaskResult::Cancelled);
        assert!(!fx.registry.git.source.exists());
        assert!(report.has(Feature::GitIdentity, Change::Cancelled));
    }

    #[test]
    fn interactive_answers_are_used() {
        let fx = Fixture::new(Mode::Interactive).with_replies(vec![
            Reply::Text("Ada".to_string()),
            Reply::Text("not-an-email".to_string()),
            Reply::Text("ada@example.com".to_string()),
        ]);
        let mut report = RunReport::new();
        ConfigureGitIdentity::required()
            .run(&fx.ctx(), &mut report)
            .unwrap();
        assert_eq!(fx.prompter.asked().len(), 3);
        let rendered = std::fs::read_to_string(&fx.registry.git.source).unwrap();
        assert!(rendered.contains("email = ada@example.com"));
    }

    #[test]
    fn missing_template_is_a_configuration_error() {
        let fx = unattended_with(Some("Ada"), Some("ada@example.com"));
        std::fs::remove_file(&fx.registry.git_template).unwrap();
        let err = ConfigureGitIdentity::required()
            .run(&fx.ctx(), &mut RunReport::new())
            .unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn optional_variant_waits_for_input_when_unattended() {
        let fx = unattended_with(None, None);
        assert!(!ConfigureGitIdentity::when_available().should_run(&fx.ctx()));
        assert!(ConfigureGitIdentity::required().should_run(&fx.ctx()));
    }
}
