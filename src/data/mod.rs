//! Data module for configuration, voice settings and message types

mod config;
mod message;
mod settings;

pub use config::{
    AppConfig, GeneralConfig, HeadingMapConfig, KeyConfig, MagnifierConfig, PlaybackConfig,
    SpeechConfig,
};
pub use message::{Command, Request, Response, SpeakRequest, VoiceOptions};
pub use settings::{
    FileSettingsStore, MemorySettingsStore, Settings, SettingsError, SettingsStore,
    DEFAULT_VOICE_NAME,
};
