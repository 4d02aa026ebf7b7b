use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SettingsError;
use crate::versions::DEFAULT_VERSION;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// User configurable settings for the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Version token used for queries, without the label prefix (e.g. "2023").
    #[serde(rename = "DefaultVersion")]
    pub default_version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_version: DEFAULT_VERSION.to_string(),
        }
    }
}

/// Best-effort persistence of [`Settings`] as indented JSON.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `settings.json` inside `data_directory`.
    pub fn in_directory(data_directory: &Path) -> Self {
        Self::new(data_directory.join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Always yields usable settings. A missing file is created with the
    /// defaults; a corrupt file is logged and left untouched.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            debug!("No settings at {:?}, writing defaults", self.path);
            let settings = Settings::default();
            self.save(&settings);
            return settings;
        }

        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings from {:?}: {}", self.path, e);
                Settings::default()
            }
        }
    }

    /// Overwrites the file. Failures are ignored.
    pub fn save(&self, settings: &Settings) {
        if let Err(e) = self.try_save(settings) {
            debug!("Ignoring settings save failure for {:?}: {}", self.path, e);
        }
    }

    fn try_load(&self) -> Result<Settings, SettingsError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn try_save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::in_directory(dir.path());

        let settings = store.load();

        assert_eq!(settings.default_version, "2023");
        let written = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value, serde_json::json!({ "DefaultVersion": "2023" }));
    }

    #[test]
    fn test_corrupt_file_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::in_directory(dir.path());
        fs::write(store.path(), "{ not json").unwrap();

        let settings = store.load();

        assert_eq!(settings, Settings::default());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_save_overwrites_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::in_directory(dir.path());
        fs::write(store.path(), "garbage").unwrap();

        store.save(&Settings {
            default_version: "2025.3".to_string(),
        });

        assert_eq!(store.load().default_version, "2025.3");
    }

    #[test]
    fn test_save_is_indented() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::in_directory(dir.path());

        store.save(&Settings {
            default_version: "2024".to_string(),
        });

        let written = fs::read_to_string(store.path()).unwrap();
        assert!(written.contains('\n'));
        assert!(written.contains("\"DefaultVersion\": \"2024\""));
    }

    #[test]
    fn test_save_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::in_directory(&dir.path().join("nested").join("plugin"));

        store.save(&Settings::default());

        assert!(store.path().exists());
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        // The target path is a directory, so the write must fail.
        let store = SettingsStore::new(dir.path());
        store.save(&Settings::default());
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::in_directory(dir.path());
        fs::write(
            store.path(),
            r#"{ "DefaultVersion": "2026", "Extra": true }"#,
        )
        .unwrap();

        assert_eq!(store.load().default_version, "2026");
    }
}
