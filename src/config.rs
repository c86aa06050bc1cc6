// Application settings
// Loaded from <config dir>/rusty-dashboard/settings.json

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Settings for the remote dashboard generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Model identifier passed in the request path.
    pub model: String,

    /// API base URL, without trailing slash.
    pub api_base: String,

    /// Name of the environment variable holding the API key.
    /// Keys are never written to settings.json.
    pub api_key_env: String,

    pub request_timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "theme.darkMode")]
    pub dark_mode: bool,

    #[serde(rename = "ai")]
    pub ai: AiSettings,

    /// Where this instance was loaded from and will be saved to.
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            ai: AiSettings::default(),
            path: None,
        }
    }
}

impl Settings {
    /// Default settings file location.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rusty-dashboard")
            .join("settings.json")
    }

    /// Read settings once at startup, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let mut settings = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("Error reading {}: {e}; using defaults", path.display());
                Self::default()
            }
        };
        settings.path = Some(path.to_path_buf());
        settings
    }

    /// Write settings back to where they were loaded from.
    pub fn save(&self) -> Result<()> {
        let path = self.path.clone().unwrap_or_else(Self::config_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serializing settings")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Flip the theme and persist it.
    pub fn toggle_dark_mode(&mut self) -> Result<()> {
        self.dark_mode = !self.dark_mode;
        self.save()
    }
}
