use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// User-tunable settings, read from `simple-chat.toml` in the config dir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reply_delay_ms: u64,
    pub welcome_text: String,
    pub reply_text: String,
    pub local_name: String,
    pub counterpart_name: String,
    /// Overrides the default sqlite location under the data dir.
    pub database: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1500,
            welcome_text: "Welcome to the chat! How can I assist you today?".to_string(),
            reply_text: "I'm here to help! Feel free to ask me anything.".to_string(),
            local_name: "You".to_string(),
            counterpart_name: "ChatBot".to_string(),
            database: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("simple-chat.toml"))
    }

    /// Settings from the default location. A missing or broken file means
    /// defaults; the latter is logged.
    pub fn load() -> Self {
        let Some(path) = Self::toml_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str::<Self>(&text)?.sanitized())
    }

    /// Blank texts and names are replaced by their defaults; a blank
    /// welcome would otherwise end up in every stored snapshot.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        for (field, fallback) in [
            (&mut self.welcome_text, defaults.welcome_text),
            (&mut self.reply_text, defaults.reply_text),
            (&mut self.local_name, defaults.local_name),
            (&mut self.counterpart_name, defaults.counterpart_name),
        ] {
            if field.trim().is_empty() {
                *field = fallback;
            }
        }
        self
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn reply_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.reply_delay_ms)
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
