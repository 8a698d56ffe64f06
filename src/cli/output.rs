use colored::Colorize;
use std::fmt;
use std::sync::{OnceLock, RwLock};

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Section,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OutputPreferences {
    /// Skip ANSI styling; used for scripted sessions.
    pub plain: bool,
}

static PREFERENCES: OnceLock<RwLock<OutputPreferences>> = OnceLock::new();

pub fn set_preferences(prefs: OutputPreferences) {
    let lock = PREFERENCES.get_or_init(|| RwLock::new(OutputPreferences::default()));
    if let Ok(mut guard) = lock.write() {
        *guard = prefs;
    }
}

fn preferences() -> OutputPreferences {
    PREFERENCES
        .get_or_init(|| RwLock::new(OutputPreferences::default()))
        .read()
        .map(|guard| *guard)
        .unwrap_or_default()
}

fn build_label(kind: MessageKind) -> (&'static str, &'static str) {
    match kind {
        MessageKind::Info => ("INFO", "[i]"),
        MessageKind::Success => ("SUCCESS", "[✓]"),
        MessageKind::Warning => ("WARNING", "[!]"),
        MessageKind::Error => ("ERROR", "[x]"),
        MessageKind::Section => ("INFO", ""),
    }
}

fn apply_style(kind: MessageKind, message: impl fmt::Display, prefs: &OutputPreferences) -> String {
    let text = message.to_string();

    let formatted = match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()),
        _ => {
            let (label, icon) = build_label(kind);
            format!("{label}: {icon} {text}")
        }
    };

    if prefs.plain {
        return formatted;
    }

    match kind {
        MessageKind::Success => formatted.bright_green().to_string(),
        MessageKind::Warning => formatted.bright_yellow().to_string(),
        MessageKind::Error => formatted.bright_red().to_string(),
        MessageKind::Section => formatted.bold().to_string(),
        MessageKind::Info => formatted,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = apply_style(kind, message, &preferences());
    match kind {
        MessageKind::Section => println!("\n{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Raw line for structured output such as JSON documents.
pub fn raw(text: impl fmt::Display) {
    println!("{}", text);
}
