//! Core CLI dispatch, error types and shell context helpers.

use std::io;

use rustyline::error::ReadlineError;
use strsim::levenshtein;
use uuid::Uuid;

use crate::errors::FormError;
use crate::files::FileRecord;
use crate::form::{FieldDefinition, FieldType, FieldValue};
use crate::signature::SignatureMode;

use super::io as cli_io;
use super::output::section as output_section;
pub use super::shell_context::{CliMode, ShellContext};
use super::registry::CommandEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl ShellContext {
    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            let result = match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            };
            self.refresh();
            result
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    /// Re-renders the current step after state changes in interactive use.
    fn refresh(&mut self) {
        if self.form.take_redraw() && self.mode == CliMode::Interactive {
            self.print_current_step();
        }
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, input), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(cli_io::confirm_action(&self.theme, "Exit shell?", false)?)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(&message);
                cli_io::print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Form(FormError::UnknownField(key)) => {
                cli_io::print_error(format!("No field named `{key}` in this form."));
                cli_io::print_hint("Use `status` to list the fields of the current step.");
                Ok(())
            }
            other => {
                cli_io::print_error(other.to_string());
                Ok(())
            }
        }
    }

    /// Header, field values and visible errors of the current step.
    pub(crate) fn print_current_step(&self) {
        let section = self.form.current_section();
        let state = self.form.state();
        output_section(format!(
            "Step {}/{}: {}",
            state.current_step() + 1,
            self.form.config().step_count(),
            section.title
        ));
        if let Some(description) = &section.description {
            cli_io::print_info(description);
        }
        for field in &section.fields {
            cli_io::print_info(format!(
                "  {:<18} {}",
                field_label(field),
                self.describe_value(field)
            ));
            if let Some(error) = state.visible_error(&field.key) {
                cli_io::print_error(format!("  {}: {}", field.key, error));
            }
        }
    }

    fn describe_value(&self, field: &FieldDefinition) -> String {
        let state = self.form.state();
        match &field.field_type {
            FieldType::Signature(_) => {
                let Some(capture) = state.signature(&field.key) else {
                    return String::new();
                };
                let mode = match capture.mode() {
                    SignatureMode::Draw => "draw",
                    SignatureMode::Upload => "upload",
                };
                format!(
                    "[{mode}] {} segment(s); {}",
                    capture.segments().len(),
                    capture.status().unwrap_or("No signature")
                )
            }
            FieldType::File(_) => {
                let files = state.files(&field.key);
                if files.is_empty() {
                    "(no files)".to_string()
                } else {
                    files
                        .iter()
                        .map(|record| record.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                }
            }
            FieldType::Password => match state.value(&field.key) {
                Some(value) if !value.is_blank() => "********".to_string(),
                _ => String::new(),
            },
            _ => state
                .value(&field.key)
                .map(FieldValue::to_string)
                .unwrap_or_default(),
        }
    }

    /// Errors recorded for the fields of `step`.
    pub(crate) fn print_step_errors(&self, step: usize) {
        let Some(section) = self.form.config().sections.get(step) else {
            return;
        };
        for field in &section.fields {
            if let Some(error) = self.form.state().error(&field.key) {
                cli_io::print_error(format!("{}: {}", field.key, error));
            }
        }
    }
}

fn field_label(field: &FieldDefinition) -> String {
    if field.required {
        format!("{}*", field.key)
    } else {
        field.key.clone()
    }
}

pub(crate) fn require_args(args: &[&str], count: usize, usage: &str) -> CommandResult {
    if args.len() < count {
        Err(CommandError::InvalidArguments(format!("usage: {usage}")))
    } else {
        Ok(())
    }
}

/// Finds an attached file by full id or unambiguous id prefix.
pub(crate) fn find_file(files: &[FileRecord], needle: &str) -> Result<Uuid, CommandError> {
    let needle = needle.to_ascii_lowercase();
    let matches: Vec<Uuid> = files
        .iter()
        .filter(|record| {
            record.id.simple().to_string().starts_with(&needle)
                || record.id.to_string().starts_with(&needle)
        })
        .map(|record| record.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CommandError::InvalidArguments(format!(
            "no attached file matches `{needle}`"
        ))),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{needle}` matches more than one file"
        ))),
    }
}

pub(crate) fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(8);
    short
}
