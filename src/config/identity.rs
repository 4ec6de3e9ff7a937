//! Identity inputs for git and ssh, and their resolution into validated values.
//!
//! Lookup order for every value is flag, then its specific environment
//! variable, then the shared `--email`/`EMAIL` fallback (email fields only).
//! An explicit value is used as-is once it validates. Otherwise interactive
//! runs prompt with the fallback as default, and unattended runs fail.
use std::fmt;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use super::{Mode, RunConfig};
use crate::cli::IdentityOpts;
use crate::error::ValidationError;
use crate::logging::Logger;
use crate::prompt::{Answer, Prompter, ask_until_valid};

#[allow(clippy::expect_used)] // literal pattern
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern is valid")
});

/// Raw identity values collected from flags and environment.
///
/// Blank values are normalised to `None`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct IdentityInputs {
    /// `--git-name` or `GIT_NAME`.
    pub git_name: Option<String>,
    /// `--git-email` or `GIT_EMAIL`.
    pub git_email: Option<String>,
    /// `--ssh-email` or `SSH_EMAIL`.
    pub ssh_email: Option<String>,
    /// `--email` or `EMAIL`.
    pub email: Option<String>,
    /// `SSH_PASSPHRASE`, honoured in unattended runs only.
    pub ssh_passphrase: Option<String>,
}

impl fmt::Debug for IdentityInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityInputs")
            .field("git_name", &self.git_name)
            .field("git_email", &self.git_email)
            .field("ssh_email", &self.ssh_email)
            .field("email", &self.email)
            .field(
                "ssh_passphrase",
                &self.ssh_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl IdentityInputs {
    /// Combine CLI flags with environment lookups.
    pub fn collect(opts: &IdentityOpts, env: &impl Fn(&str) -> Option<String>) -> Self {
        let pick = |flag: &Option<String>, var: &str| {
            non_blank(flag.clone()).or_else(|| non_blank(env(var)))
        };
        Self {
            git_name: pick(&opts.git_name, "GIT_NAME"),
            git_email: pick(&opts.git_email, "GIT_EMAIL"),
            ssh_email: pick(&opts.ssh_email, "SSH_EMAIL"),
            email: pick(&opts.email, "EMAIL"),
            ssh_passphrase: env("SSH_PASSPHRASE"),
        }
    }

    /// Whether enough input exists to configure git without prompting.
    #[must_use]
    pub const fn has_git_identity(&self) -> bool {
        self.git_name.is_some() && (self.git_email.is_some() || self.email.is_some())
    }

    /// Whether an ssh email is available without prompting.
    #[must_use]
    pub const fn has_ssh_email(&self) -> bool {
        self.ssh_email.is_some() || self.email.is_some()
    }
}

/// Validated git identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    /// `user.name`.
    pub name: String,
    /// `user.email`.
    pub email: String,
}

/// Reject blank names.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] for blank input.
pub fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty {
            field: "git user name",
        });
    }
    Ok(name.to_string())
}

/// Accept `local@domain.tld` shaped addresses.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] or [`ValidationError::InvalidEmail`].
pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(ValidationError::Empty { field: "email" });
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(email.to_string())
}

/// One value to resolve.
struct Field<'a> {
    label: &'static str,
    hint: &'static str,
    question: &'static str,
    explicit: Option<&'a str>,
    fallback: Option<&'a str>,
    validate: fn(&str) -> Result<String, ValidationError>,
}

fn resolve_field(
    run: &RunConfig,
    prompter: &dyn Prompter,
    log: &Logger,
    field: &Field<'_>,
) -> Result<Answer<String>> {
    if let Some(value) = field.explicit {
        match (field.validate)(value) {
            Ok(v) => return Ok(Answer::Given(v)),
            Err(e) if run.mode == Mode::Unattended => return Err(e.into()),
            Err(e) => log.warn(&format!("{e}")),
        }
    }

    match run.mode {
        Mode::Unattended => match field.fallback {
            Some(value) => Ok(Answer::Given((field.validate)(value)?)),
            None => Err(ValidationError::Missing {
                field: field.label,
                hint: field.hint,
            }
            .into()),
        },
        Mode::Interactive => {
            let default = field.explicit.or(field.fallback);
            ask_until_valid(prompter, log, field.question, default, field.validate)
        }
    }
}

/// Resolve the git user name and email.
///
/// # Errors
///
/// Returns [`ValidationError`] in unattended mode when a value is missing or
/// invalid, or an error if the prompter fails.
pub fn resolve_git_identity(
    run: &RunConfig,
    prompter: &dyn Prompter,
    log: &Logger,
) -> Result<Answer<GitIdentity>> {
    let inputs = &run.identity;
    let name_field = Field {
        label: "git user name",
        hint: "--git-name or GIT_NAME",
        question: "Git user name:",
        explicit: inputs.git_name.as_deref(),
        fallback: None,
        validate: validate_name,
    };
    let Answer::Given(name) = resolve_field(run, prompter, log, &name_field)? else {
        return Ok(Answer::Cancelled);
    };

    let email_field = Field {
        label: "git email",
        hint: "--git-email, GIT_EMAIL, --email or EMAIL",
        question: "Git email:",
        explicit: inputs.git_email.as_deref(),
        fallback: inputs.email.as_deref(),
        validate: validate_email,
    };
    let Answer::Given(email) = resolve_field(run, prompter, log, &email_field)? else {
        return Ok(Answer::Cancelled);
    };

    Ok(Answer::Given(GitIdentity { name, email }))
}

/// Resolve the email used as the ssh key comment.
///
/// # Errors
///
/// Returns [`ValidationError`] in unattended mode when the email is missing or
/// invalid, or an error if the prompter fails.
pub fn resolve_ssh_email(
    run: &RunConfig,
    prompter: &dyn Prompter,
    log: &Logger,
) -> Result<Answer<String>> {
    let inputs = &run.identity;
    let field = Field {
        label: "ssh email",
        hint: "--ssh-email, SSH_EMAIL, --email or EMAIL",
        question: "Email for the SSH key:",
        explicit: inputs.ssh_email.as_deref(),
        fallback: inputs.email.as_deref(),
        validate: validate_email,
    };
    resolve_field(run, prompter, log, &field)
}

/// Resolve the ssh key passphrase. Empty means no passphrase.
///
/// Unattended runs read `SSH_PASSPHRASE` and never prompt.
///
/// # Errors
///
/// Returns an error if the prompter fails.
pub fn resolve_passphrase(run: &RunConfig, prompter: &dyn Prompter) -> Result<Answer<String>> {
    match run.mode {
        Mode::Unattended => Ok(Answer::Given(
            run.identity.ssh_passphrase.clone().unwrap_or_default(),
        )),
        Mode::Interactive => prompter.secret("SSH key passphrase (empty for none):"),
    }
}
