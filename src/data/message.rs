//! Message types
//!
//! Inbound commands addressed to a page session, and the request/response
//! pairs handled by the speech service.

use serde::{Deserialize, Serialize};

use super::Settings;

/// Command sent to a page session (popup click, forwarded shortcut, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Start,
    Stop,
    ToggleContrast,
    ToggleHeadingMap,
    // Older popups send the camelCase action name.
    #[serde(alias = "toggleMagnifier")]
    ToggleMagnifier,
    SetVoiceRate {
        #[serde(default)]
        rate: Option<f32>,
    },
    SetVoiceName {
        #[serde(default)]
        name: Option<String>,
    },
}

/// Request handled by the speech service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    Speak { text: String },
    GetSettings,
    SetSettings { settings: Settings },
}

/// Response from the speech service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Settings(Settings),
    Ack { ok: bool },
    None,
}

/// Voice options attached to every outbound speech request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for VoiceOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            voice_name: settings.voice_name.clone().filter(|name| !name.is_empty()),
            rate: settings.rate,
            pitch: settings.pitch,
            volume: settings.volume,
        }
    }
}

/// Outbound `SPEAK` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    pub options: VoiceOptions,
}
