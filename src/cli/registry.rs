//! Command table: dispatch, help listings and what each command's arguments
//! name, so completion can offer field keys of the right kind.

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;
use crate::form::{FieldType, FormConfig};

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// What the first argument of a command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Nothing,
    Command,
    /// Fields edited with a typed value.
    ValueField,
    AnyField,
    FileField,
    SignatureField,
    Step,
}

impl Operand {
    pub fn accepts(self, field_type: &FieldType) -> bool {
        match self {
            Operand::ValueField => {
                !matches!(field_type, FieldType::File(_) | FieldType::Signature(_))
            }
            Operand::AnyField => true,
            Operand::FileField => matches!(field_type, FieldType::File(_)),
            Operand::SignatureField => matches!(field_type, FieldType::Signature(_)),
            Operand::Nothing | Operand::Command | Operand::Step => false,
        }
    }
}

pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub operand: Operand,
    /// Fixed words accepted after the operand.
    pub choices: &'static [&'static str],
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            operand: Operand::Nothing,
            choices: &[],
            handler,
        }
    }

    pub fn taking(self, operand: Operand) -> Self {
        Self { operand, ..self }
    }

    pub fn then_one_of(self, choices: &'static [&'static str]) -> Self {
        Self { choices, ..self }
    }
}

/// Commands in registration order; names are unique.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, replacing a command of the same name in place.
    pub fn register(&mut self, entry: CommandEntry) {
        match self.entries.iter_mut().find(|known| known.name == entry.name) {
            Some(known) => *known = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn list(&self) -> impl Iterator<Item = &CommandEntry> + '_ {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.get(name).map(|entry| entry.handler)
    }

    /// Words that may follow `entry` as its first argument in `form`.
    pub fn operand_words(&self, entry: &CommandEntry, form: &FormConfig) -> Vec<String> {
        match entry.operand {
            Operand::Nothing => Vec::new(),
            Operand::Command => self.names().map(str::to_string).collect(),
            Operand::Step => (1..=form.step_count()).map(|step| step.to_string()).collect(),
            operand => form
                .fields()
                .filter(|field| operand.accepts(&field.field_type))
                .map(|field| field.key.clone())
                .collect(),
        }
    }
}
