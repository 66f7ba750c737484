//! Voice Settings
//!
//! Persisted speech settings with a get/set store contract. Writers always
//! read the full object, change one field and write the full object back.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Voice seeded on install and used when nothing is stored.
pub const DEFAULT_VOICE_NAME: &str = "Google हिन्दी";

fn default_level() -> f32 {
    1.0
}

/// Speech voice settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    #[serde(default = "default_level")]
    pub rate: f32,
    #[serde(default = "default_level")]
    pub pitch: f32,
    #[serde(default = "default_level")]
    pub volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voice_name: Some(DEFAULT_VOICE_NAME.to_string()),
            rate: default_level(),
            pitch: default_level(),
            volume: default_level(),
        }
    }
}

/// Key-value access to the persisted [`Settings`].
pub trait SettingsStore: Send + Sync {
    /// Stored settings, or `None` when nothing has been written yet.
    fn get(&self) -> Result<Option<Settings>, SettingsError>;
    fn set(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Option<Settings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self) -> Result<Option<Settings>, SettingsError> {
        Ok(self
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, settings: &Settings) -> Result<(), SettingsError> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = Some(settings.clone());
        Ok(())
    }
}

/// Settings persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self) -> Result<Option<Settings>, SettingsError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn set(&self, settings: &Settings) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        tracing::debug!("Settings saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_one() {
        let settings: Settings = serde_json::from_str(r#"{"voiceName": "Alex"}"#).unwrap();
        assert_eq!(settings.voice_name.as_deref(), Some("Alex"));
        assert_eq!(settings.rate, 1.0);
        assert_eq!(settings.pitch, 1.0);
        assert_eq!(settings.volume, 1.0);

        let empty: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.voice_name, None);
        assert_eq!(
            empty,
            Settings {
                voice_name: None,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_defaults_carry_voice_name() {
        let settings = Settings::default();
        assert_eq!(settings.voice_name.as_deref(), Some(DEFAULT_VOICE_NAME));
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["voiceName"], DEFAULT_VOICE_NAME);
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySettingsStore::new();
        assert!(store.get().unwrap().is_none());
        let settings = Settings {
            rate: 1.5,
            ..Settings::default()
        };
        store.set(&settings).unwrap();
        assert_eq!(store.get().unwrap(), Some(settings));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));
        assert!(store.get().unwrap().is_none());

        let settings = Settings {
            voice_name: Some("Google UK English".to_string()),
            rate: 0.8,
            pitch: 1.2,
            volume: 0.5,
        };
        store.set(&settings).unwrap();
        assert_eq!(store.get().unwrap(), Some(settings));
    }

    #[test]
    fn test_file_store_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        let store = FileSettingsStore::new(path);
        assert!(matches!(store.get(), Err(SettingsError::Malformed(_))));
    }
}
