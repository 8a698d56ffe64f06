//! Shared runtime state for CLI interactions and command execution.

use std::{env, path::PathBuf};

use dialoguer::theme::ColorfulTheme;
use serde_json::{json, Map, Value};

use crate::config::{AppConfig, ConfigManager};
use crate::form::{FormConfig, FormController, PayloadValue, SubmissionPayload};

use super::core::CliError;
use super::io as cli_io;
use super::output::{self, OutputPreferences};
use super::registry::CommandRegistry;

pub const SCRIPT_ENV: &str = "SLNIC_BRIDGE_CLI_SCRIPT";
pub const FORM_ENV: &str = "SLNIC_BRIDGE_FORM";
pub const HOME_ENV: &str = "SLNIC_BRIDGE_HOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub form: FormController,
    pub theme: ColorfulTheme,
    pub config: AppConfig,
    pub form_path: Option<PathBuf>,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        output::set_preferences(OutputPreferences {
            plain: mode == CliMode::Script,
        });

        let config_manager = match env::var_os(HOME_ENV) {
            Some(home) => ConfigManager::with_base_dir(PathBuf::from(home))?,
            None => ConfigManager::new()?,
        };
        let mut config = config_manager.load()?;

        let form_path = match env::var_os(FORM_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => remembered_form(&config),
        };
        let definition = match &form_path {
            Some(path) => FormConfig::load(path)?,
            None => FormConfig::nic_application()?,
        };
        if form_path.is_some() && config.last_form != form_path {
            config.last_form = form_path.clone();
            config_manager.save(&config)?;
        }
        if let Some(path) = &form_path {
            tracing::info!(path = %path.display(), form = %definition.id, "form definition loaded");
        }

        let form = FormController::new(definition)?
            .with_retry_policy(config.file_read)
            .with_file_listing(true)
            .with_submit_handler(|payload| {
                output::section("Submission");
                output::raw(serde_json::to_string_pretty(&payload_summary(payload))?);
                Ok(())
            })
            .with_cancel_handler(|| cli_io::print_info("Application cancelled."));

        Ok(Self {
            mode,
            registry: super::commands::registry(),
            form,
            theme: ColorfulTheme::default(),
            config,
            form_path,
        })
    }

    pub fn prompt(&self) -> String {
        let step = self.form.state().current_step();
        format!(
            "slnic [{}/{}] {}> ",
            step + 1,
            self.form.config().step_count(),
            self.form.current_section().title
        )
    }
}

/// Last form opened, when its file still exists.
fn remembered_form(config: &AppConfig) -> Option<PathBuf> {
    let path = config.last_form.as_ref()?;
    if path.is_file() {
        Some(path.clone())
    } else {
        tracing::warn!(path = %path.display(), "remembered form is gone; using the built-in form");
        None
    }
}

/// JSON view of a payload with signature bytes reduced to their length.
pub fn payload_summary(payload: &SubmissionPayload) -> Value {
    let mut entries = Map::new();
    for (key, value) in &payload.entries {
        let rendered = match value {
            PayloadValue::Signature(entry) => json!({
                "type": entry.kind,
                "format": entry.format,
                "bytes": entry.data.len(),
            }),
            other => serde_json::to_value(other).unwrap_or(Value::Null),
        };
        entries.insert(key.clone(), rendered);
    }
    json!({
        "form_id": payload.form_id,
        "submitted_at": payload.submitted_at.to_rfc3339(),
        "entries": entries,
    })
}
