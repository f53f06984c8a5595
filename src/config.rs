use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime settings, read from `config.yaml` in the project directory.
///
/// Every key is optional; anything left out falls back to the defaults
/// below. `PODTALES_DATA_DIR` (process environment first, then `.env`)
/// overrides `data_dir`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    /// How long the share button shows "Copied!" after a clipboard fallback.
    pub copied_reset_ms: u64,
    /// How long the "Link Copied!" toast stays up.
    pub copy_toast_ms: u64,
    pub share_title_fallback: String,
    /// `{title}` and `{author}` are substituted.
    pub share_text_template: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("podtales"),
            database_file: "podtales.db".to_string(),
            copied_reset_ms: 2000,
            copy_toast_ms: 3000,
            share_title_fallback: "Check out this podcast".to_string(),
            share_text_template: "Listen to {title} by {author} on PodTales!".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(project_dir: &Path) -> Result<Self, AppError> {
        let config_path = project_dir.join("config.yaml");
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(content) if content.trim().is_empty() => AppConfig::default(),
            Ok(content) => {
                let parsed: AppConfig = serde_yaml::from_str(&content)?;
                log::info!("Loaded config from {}", config_path.display());
                parsed
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config.yaml in {}, using defaults", project_dir.display());
                AppConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        let data_dir = std::env::var("PODTALES_DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| load_env_value(project_dir, "PODTALES_DATA_DIR"));
        if let Some(dir) = data_dir {
            log::info!("Data directory overridden: {}", dir);
            config.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn copied_reset(&self) -> Duration {
        Duration::from_millis(self.copied_reset_ms)
    }

    pub fn copy_toast_duration(&self) -> Duration {
        Duration::from_millis(self.copy_toast_ms)
    }

    pub fn share_text(&self, title: &str, author: &str) -> String {
        self.share_text_template
            .replace("{title}", title)
            .replace("{author}", author)
    }
}

/// Load a value from the .env file by key name
pub fn load_env_value(project_dir: &Path, key: &str) -> Option<String> {
    let env_path = project_dir.join(".env");
    let prefix = format!("{}=", key);
    if let Ok(content) = std::fs::read_to_string(&env_path) {
        for line in content.lines() {
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix(&prefix) {
                let value = rest.trim().trim_matches('"').trim_matches('\'');
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}
