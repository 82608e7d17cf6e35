//! Broker settings
//!
//! Stores non-sensitive configuration in a plain JSON file. Nothing in here
//! is ever a credential.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SettingsError;
use crate::storage::DEFAULT_INDEX_NAMESPACE;

/// Settings file name inside the configuration directory
const SETTINGS_FILE: &str = "settings.json";

/// Broker settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Keychain service name holding the per-service account index
    pub index_namespace: String,
    /// Log filter directive used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            index_namespace: DEFAULT_INDEX_NAMESPACE.to_string(),
            log_filter: "warn".to_string(),
        }
    }
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load settings from `settings_file`, using defaults if it does not exist
    pub fn load(settings_file: PathBuf) -> Result<Self, SettingsError> {
        let settings = Self::load_from_file(&settings_file)?;
        Ok(Self {
            settings_file,
            settings,
        })
    }

    /// Default settings bound to `settings_file`, without reading it
    pub fn with_defaults(settings_file: PathBuf) -> Self {
        Self {
            settings_file,
            settings: Settings::default(),
        }
    }

    /// Default settings file location
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        ProjectDirs::from("org", "credbroker", "credbroker")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
            .ok_or(SettingsError::NoConfigDir)
    }

    fn load_from_file(path: &Path) -> Result<Settings, SettingsError> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.settings_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.settings)?;

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        std::fs::write(&temp_path, &contents)?;
        std::fs::rename(&temp_path, &self.settings_file)?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Path of the backing settings file
    pub fn path(&self) -> &Path {
        &self.settings_file
    }

    /// Whether the settings file exists on disk
    pub fn is_persisted(&self) -> bool {
        self.settings_file.exists()
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Reset to defaults and save
    pub fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = Settings::default();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::load(temp_dir.path().join(SETTINGS_FILE)).unwrap();

        assert_eq!(manager.get().index_namespace, "credbroker.accounts");
        assert_eq!(manager.get().log_filter, "warn");
        assert!(!manager.is_persisted());
    }

    #[test]
    fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(SETTINGS_FILE);

        {
            let mut manager = SettingsManager::load(path.clone()).unwrap();
            manager.get_mut().index_namespace = "team.accounts".to_string();
            manager.get_mut().log_filter = "credbroker_core=debug".to_string();
            manager.save().unwrap();
        }

        let manager = SettingsManager::load(path).unwrap();
        assert!(manager.is_persisted());
        assert_eq!(manager.get().index_namespace, "team.accounts");
        assert_eq!(manager.get().log_filter, "credbroker_core=debug");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{ "logFilter": "info" }"#).unwrap();

        let manager = SettingsManager::load(path).unwrap();
        assert_eq!(manager.get().log_filter, "info");
        assert_eq!(manager.get().index_namespace, DEFAULT_INDEX_NAMESPACE);
        assert_eq!(manager.get().version, 1);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            SettingsManager::load(path),
            Err(SettingsError::SerializationError(_))
        ));
    }

    #[test]
    fn test_with_defaults_ignores_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "not json").unwrap();

        let manager = SettingsManager::with_defaults(path.clone());
        assert_eq!(manager.get(), &Settings::default());

        manager.save().unwrap();
        assert!(SettingsManager::load(path).is_ok());
    }

    #[test]
    fn test_reset() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::load(temp_dir.path().join(SETTINGS_FILE)).unwrap();
        manager.get_mut().log_filter = "trace".to_string();

        manager.reset().unwrap();
        assert_eq!(manager.get(), &Settings::default());
        assert!(manager.is_persisted());
    }
}
