use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::{FormError, FormResult};
use crate::files::RetryPolicy;

const APP_DIR: &str = "slnic-bridge";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

/// Host application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_title: String,
    pub file_read: RetryPolicy,
    /// Form definition reopened when no form is named on startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_form: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_title: "SL NIC Bridge".into(),
            file_read: RetryPolicy::default(),
            last_form: None,
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Manager rooted at the platform configuration directory.
    pub fn new() -> FormResult<Self> {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .ok_or_else(|| {
                FormError::InvalidConfig("no configuration directory available".into())
            })?;
        Self::with_base_dir(base)
    }

    pub fn with_base_dir(base: impl Into<PathBuf>) -> FormResult<Self> {
        let root = base.into().join(APP_DIR);
        fs::create_dir_all(&root)?;
        Ok(Self {
            path: root.join(CONFIG_FILE),
        })
    }

    /// Stored settings, or defaults when nothing was saved yet.
    pub fn load(&self) -> FormResult<AppConfig> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(AppConfig::default())
        }
    }

    pub fn save(&self, config: &AppConfig) -> FormResult<()> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> FormResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path(Path::new("/x/config.json")),
            PathBuf::from("/x/config.json.tmp")
        );
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"last_form":"/forms/custom.json"}"#).unwrap();
        assert_eq!(config.last_form, Some(PathBuf::from("/forms/custom.json")));
        assert_eq!(config.app_title, "SL NIC Bridge");
        assert_eq!(config.file_read, RetryPolicy::default());
    }
}
