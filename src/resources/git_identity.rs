//! Generated git configuration.
use std::path::Path;

use anyhow::{Context as _, Result};

use super::ResourceChange;
use crate::config::identity::GitIdentity;

/// Placeholder replaced with the user name.
pub const NAME_PLACEHOLDER: &str = "__GIT_USER_NAME__";
/// Placeholder replaced with the email address.
pub const EMAIL_PLACEHOLDER: &str = "__GIT_USER_EMAIL__";

/// Substitute the identity into `template`.
#[must_use]
pub fn render(template: &str, identity: &GitIdentity) -> String {
    template
        .replace(NAME_PLACEHOLDER, &identity.name)
        .replace(EMAIL_PLACEHOLDER, &identity.email)
}

/// Render `template_path` into `output_path`.
///
/// The output is only rewritten when its content would change.
///
/// # Errors
///
/// Returns an error if the template cannot be read or the output written.
pub fn write_config(
    template_path: &Path,
    output_path: &Path,
    identity: &GitIdentity,
) -> Result<ResourceChange> {
    let template = std::fs::read_to_string(template_path)
        .with_context(|| format!("reading {}", template_path.display()))?;
    let rendered = render(&template, identity);

    let change = match std::fs::read_to_string(output_path) {
        Ok(existing) if existing == rendered => return Ok(ResourceChange::AlreadyCorrect),
        Ok(_) => ResourceChange::Updated,
        Err(_) => ResourceChange::Created,
    };
    std::fs::write(output_path, rendered)
        .with_context(|| format!("writing {}", output_path.display()))?;
    Ok(change)
}
