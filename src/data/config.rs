//! Application Configuration
//!
//! Handles loading and saving application configuration.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub keys: KeyConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub magnifier: MagnifierConfig,
    #[serde(default)]
    pub heading_map: HeadingMapConfig,
}

impl AppConfig {
    fn exe_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::exe_dir().join("config.toml")
    }

    /// Get the voice settings file path
    pub fn settings_path() -> PathBuf {
        Self::exe_dir().join("settings.json")
    }

    /// Load configuration from file or create default
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(&Self::config_path())
    }

    pub fn load_or_default_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = AppConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// General configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_language")]
    pub language: String,
    /// Start accessibility mode as soon as a page is loaded.
    #[serde(default)]
    pub activate_on_load: bool,
}

fn default_language() -> String {
    "en-IN".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            activate_on_load: false,
        }
    }
}

/// Single-key navigation bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyConfig {
    #[serde(default = "default_headings_key")]
    pub headings: char,
    #[serde(default = "default_links_key")]
    pub links: char,
    #[serde(default = "default_buttons_key")]
    pub buttons: char,
    #[serde(default = "default_next_key")]
    pub next: char,
    #[serde(default = "default_previous_key")]
    pub previous: char,
    #[serde(default = "default_read_key")]
    pub read_paragraph: char,
}

fn default_headings_key() -> char {
    'h'
}

fn default_links_key() -> char {
    'l'
}

fn default_buttons_key() -> char {
    'b'
}

fn default_next_key() -> char {
    'n'
}

fn default_previous_key() -> char {
    'p'
}

fn default_read_key() -> char {
    'r'
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            headings: default_headings_key(),
            links: default_links_key(),
            buttons: default_buttons_key(),
            next: default_next_key(),
            previous: default_previous_key(),
            read_paragraph: default_read_key(),
        }
    }
}

/// Speech output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
}

fn default_max_text_chars() -> usize {
    3000
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
        }
    }
}

/// Sentence playback timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_min_sentence_ms")]
    pub min_sentence_ms: u64,
    #[serde(default = "default_per_char_ms")]
    pub per_char_ms: u64,
}

fn default_min_sentence_ms() -> u64 {
    800
}

fn default_per_char_ms() -> u64 {
    40
}

impl PlaybackConfig {
    /// How long a sentence stays highlighted before the next one starts.
    pub fn sentence_delay(&self, sentence: &str) -> Duration {
        let chars = sentence.chars().count() as u64;
        Duration::from_millis(self.min_sentence_ms.max(self.per_char_ms.saturating_mul(chars)))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            min_sentence_ms: default_min_sentence_ms(),
            per_char_ms: default_per_char_ms(),
        }
    }
}

/// Magnifier lens configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnifierConfig {
    #[serde(default = "default_lens_size")]
    pub lens_size: u32,
    #[serde(default = "default_zoom")]
    pub zoom: f32,
}

fn default_lens_size() -> u32 {
    220
}

fn default_zoom() -> f32 {
    2.0
}

impl Default for MagnifierConfig {
    fn default() -> Self {
        Self {
            lens_size: default_lens_size(),
            zoom: default_zoom(),
        }
    }
}

/// Heading map overlay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingMapConfig {
    #[serde(default = "default_max_entry_chars")]
    pub max_entry_chars: usize,
}

fn default_max_entry_chars() -> usize {
    80
}

impl Default for HeadingMapConfig {
    fn default() -> Self {
        Self {
            max_entry_chars: default_max_entry_chars(),
        }
    }
}
