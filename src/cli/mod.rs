//! Terminal host that drives one form session from a command shell.

pub mod commands;
pub mod core;
pub mod help;
pub mod io;
pub mod output;
pub mod picker;
pub mod registry;
pub mod shell;
pub mod shell_context;

pub use self::core::{CliError, CommandError};
pub use picker::PathPicker;
pub use shell::run_cli;
