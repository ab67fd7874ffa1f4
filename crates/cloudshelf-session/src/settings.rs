//! User settings persisted as TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cloudshelf_core::ClientConfig;

use crate::constants::{CONFIG_DIR_NAME, SETTINGS_FILE_NAME};

/// Errors reading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("No config directory")]
    NoConfigDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid client settings: {0}")]
    Invalid(String),
}

/// Persistent user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend connection.
    pub client: ClientConfig,
    /// Ask before destructive commands.
    pub confirm_destructive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            confirm_destructive: true,
        }
    }
}

impl Settings {
    /// Get the config file path.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Load settings from the config directory, or return defaults.
    ///
    /// A missing file is not an error. An unreadable or invalid one is
    /// logged and ignored.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "Ignoring settings file");
            Self::default()
        })
    }

    /// Load and validate settings from `path`.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the config directory.
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        ClientConfig::builder()
            .base_url(self.client.base_url.clone())
            .timeout_ms(self.client.timeout_ms)
            .refetch_delay_ms(self.client.refetch_delay_ms)
            .build()
            .map(drop)
            .map_err(|e| SettingsError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.client.base_url = "http://10.1.2.3:5000/api".to_string();
        settings.confirm_destructive = false;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[client]\ntimeout_ms = 2500\n").unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.client.timeout_ms, 2500);
        assert_eq!(loaded.client.base_url, ClientConfig::default().base_url);
        assert!(loaded.confirm_destructive);
    }

    #[test]
    fn test_invalid_client_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[client]\nbase_url = \"ftp://nowhere\"\n").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "client = [").unwrap();

        assert!(matches!(
            Settings::load_from(&path),
            Err(SettingsError::Parse(_))
        ));
    }
}
