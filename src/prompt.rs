//! Interactive questions.
//!
//! Every prompt returns either a value or an explicit [`Answer::Cancelled`];
//! Ctrl-C and Esc never surface as errors.
use anyhow::Result;

use crate::error::ValidationError;
use crate::logging::Logger;

/// Outcome of a single prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer<T> {
    /// The user answered.
    Given(T),
    /// The user aborted the prompt.
    Cancelled,
}

/// Source of answers for interactive questions.
pub trait Prompter: std::fmt::Debug {
    /// Ask a yes/no question.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn confirm(&self, question: &str, default: bool) -> Result<Answer<bool>>;

    /// Ask for a line of text, pre-filled with `default` when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn text(&self, question: &str, default: Option<&str>) -> Result<Answer<String>>;

    /// Ask for a secret without echoing it. An empty answer is allowed.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn secret(&self, question: &str) -> Result<Answer<String>>;
}

/// Prompter backed by the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

fn answer<T>(result: std::result::Result<T, inquire::InquireError>) -> Result<Answer<T>> {
    match result {
        Ok(value) => Ok(Answer::Given(value)),
        Err(
            inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted,
        ) => Ok(Answer::Cancelled),
        Err(e) => Err(e.into()),
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str, default: bool) -> Result<Answer<bool>> {
        answer(
            inquire::Confirm::new(question)
                .with_default(default)
                .prompt(),
        )
    }

    fn text(&self, question: &str, default: Option<&str>) -> Result<Answer<String>> {
        let mut prompt = inquire::Text::new(question);
        if let Some(default) = default {
            prompt = prompt.with_default(default);
        }
        answer(prompt.prompt())
    }

    fn secret(&self, question: &str) -> Result<Answer<String>> {
        answer(
            inquire::Password::new(question)
                .without_confirmation()
                .with_display_mode(inquire::PasswordDisplayMode::Masked)
                .prompt(),
        )
    }
}

/// Ask `question` until `validate` accepts the answer or the user cancels.
///
/// Rejected answers are reported through `log` and the question is asked
/// again with the same default.
///
/// # Errors
///
/// Returns an error only if the prompter itself fails.
pub fn ask_until_valid<T>(
    prompter: &dyn Prompter,
    log: &Logger,
    question: &str,
    default: Option<&str>,
    validate: impl Fn(&str) -> std::result::Result<T, ValidationError>,
) -> Result<Answer<T>> {
    loop {
        let Answer::Given(raw) = prompter.text(question, default)? else {
            return Ok(Answer::Cancelled);
        };
        match validate(&raw) {
            Ok(value) => return Ok(Answer::Given(value)),
            Err(e) => log.warn(&format!("{e}, try again")),
        }
    }
}
