//! Speech plumbing
//!
//! [`SpeechService`] is the background side: it owns the settings store and
//! the synthesizer and answers `SPEAK` / `GET_SETTINGS` / `SET_SETTINGS`.
//! [`Speaker`] is the page side: it sanitizes text and talks to the service
//! only through those requests.

use std::sync::Arc;

use crate::business::sanitizer::sanitize_text;
use crate::data::{Request, Response, Settings, SettingsError, SettingsStore, SpeakRequest, VoiceOptions};
use crate::platform::SpeechSynthesizer;

/// Background speech service
pub struct SpeechService {
    store: Arc<dyn SettingsStore>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl SpeechService {
    pub fn new(store: Arc<dyn SettingsStore>, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { store, synthesizer }
    }

    /// Seeds the store with default settings if it is empty.
    /// Returns whether anything was written.
    pub fn install_defaults(&self) -> Result<bool, SettingsError> {
        if self.store.get()?.is_some() {
            return Ok(false);
        }
        self.store.set(&Settings::default())?;
        tracing::info!("Default voice settings installed");
        Ok(true)
    }

    /// Stored settings, falling back to defaults.
    pub fn settings(&self) -> Settings {
        match self.store.get() {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::error!("Failed to read settings, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::Speak { text } => {
                self.speak(text);
                Response::None
            }
            Request::GetSettings => Response::Settings(self.settings()),
            Request::SetSettings { settings } => match self.store.set(&settings) {
                Ok(()) => Response::Ack { ok: true },
                Err(e) => {
                    tracing::error!("Failed to save settings: {}", e);
                    Response::Ack { ok: false }
                }
            },
        }
    }

    fn speak(&self, text: String) {
        let request = SpeakRequest {
            text,
            options: VoiceOptions::from(&self.settings()),
        };
        if let Err(e) = self.synthesizer.speak(&request) {
            tracing::error!("TTS error: {}", e);
        }
    }
}

/// Page-side speech client
pub struct Speaker {
    service: Arc<SpeechService>,
    max_chars: usize,
}

impl Speaker {
    pub fn new(service: Arc<SpeechService>, max_chars: usize) -> Self {
        Self { service, max_chars }
    }

    /// Fire-and-forget speech request.
    pub fn speak(&self, text: &str) {
        let text = sanitize_text(text, self.max_chars);
        if text.is_empty() {
            tracing::trace!("Skipping empty speech request");
            return;
        }
        tracing::debug!("Speak: {}", text);
        self.service.handle(Request::Speak { text });
    }

    /// Read-modify-write of the full settings object.
    pub fn update_settings<F>(&self, change: F) -> bool
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = match self.service.handle(Request::GetSettings) {
            Response::Settings(settings) => settings,
            other => {
                tracing::warn!("Unexpected settings response: {:?}", other);
                Settings::default()
            }
        };
        change(&mut settings);
        matches!(
            self.service.handle(Request::SetSettings { settings }),
            Response::Ack { ok: true }
        )
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::data::MemorySettingsStore;
    use crate::platform::SynthesisError;
    use std::sync::Mutex;

    /// Synthesizer that records every request.
    #[derive(Default)]
    pub struct RecordingSynthesizer {
        pub requests: Mutex<Vec<SpeakRequest>>,
    }

    impl RecordingSynthesizer {
        pub fn texts(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.text.clone())
                .collect()
        }

        pub fn last(&self) -> Option<String> {
            self.texts().pop()
        }

        pub fn clear(&self) {
            self.requests.lock().unwrap().clear();
        }
    }

    impl SpeechSynthesizer for RecordingSynthesizer {
        fn speak(&self, request: &SpeakRequest) -> Result<(), SynthesisError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    pub fn recording_speaker() -> (Arc<Speaker>, Arc<RecordingSynthesizer>) {
        let synth = Arc::new(RecordingSynthesizer::default());
        let service = Arc::new(SpeechService::new(
            Arc::new(MemorySettingsStore::new()),
            synth.clone(),
        ));
        (Arc::new(Speaker::new(service, 3000)), synth)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSynthesizer;
    use super::*;
    use crate::data::{MemorySettingsStore, DEFAULT_VOICE_NAME};
    use crate::platform::SynthesisError;

    struct FailingSynthesizer;

    impl SpeechSynthesizer for FailingSynthesizer {
        fn speak(&self, _request: &SpeakRequest) -> Result<(), SynthesisError> {
            Err(SynthesisError::Failed("engine busy".into()))
        }
    }

    fn service_with(store: Arc<MemorySettingsStore>) -> (Arc<SpeechService>, Arc<RecordingSynthesizer>) {
        let synth = Arc::new(RecordingSynthesizer::default());
        (Arc::new(SpeechService::new(store, synth.clone())), synth)
    }

    #[test]
    fn test_install_defaults_only_once() {
        let store = Arc::new(MemorySettingsStore::new());
        let (service, _) = service_with(store.clone());
        assert!(service.install_defaults().unwrap());
        assert!(!service.install_defaults().unwrap());
        assert_eq!(store.get().unwrap(), Some(Settings::default()));
    }

    #[test]
    fn test_speak_uses_stored_voice_options() {
        let store = Arc::new(MemorySettingsStore::with_settings(Settings {
            voice_name: Some("Alex".into()),
            rate: 1.4,
            pitch: 0.9,
            volume: 0.7,
        }));
        let (service, synth) = service_with(store);
        let speaker = Speaker::new(service, 3000);

        speaker.speak("  Hello \n there ");
        let requests = synth.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text, "Hello there");
        assert_eq!(requests[0].options.voice_name.as_deref(), Some("Alex"));
        assert_eq!(requests[0].options.rate, 1.4);
        assert_eq!(requests[0].options.pitch, 0.9);
        assert_eq!(requests[0].options.volume, 0.7);
    }

    #[test]
    fn test_speak_defaults_without_settings() {
        let (service, synth) = service_with(Arc::new(MemorySettingsStore::new()));
        service.handle(Request::Speak { text: "Hi".into() });
        let requests = synth.requests.lock().unwrap();
        assert_eq!(requests[0].options, VoiceOptions::default());
        assert_eq!(requests[0].options.voice_name.as_deref(), Some(DEFAULT_VOICE_NAME));
    }

    #[test]
    fn test_empty_text_not_spoken() {
        let (service, synth) = service_with(Arc::new(MemorySettingsStore::new()));
        Speaker::new(service, 3000).speak(" \n ");
        assert!(synth.texts().is_empty());
    }

    #[test]
    fn test_synthesizer_failure_is_swallowed() {
        let service = SpeechService::new(
            Arc::new(MemorySettingsStore::new()),
            Arc::new(FailingSynthesizer),
        );
        assert_eq!(service.handle(Request::Speak { text: "x".into() }), Response::None);
    }

    #[test]
    fn test_settings_round_trip_preserves_other_fields() {
        let store = Arc::new(MemorySettingsStore::with_settings(Settings {
            voice_name: Some("Alex".into()),
            rate: 1.0,
            pitch: 0.8,
            volume: 0.6,
        }));
        let (service, _) = service_with(store);
        let speaker = Speaker::new(service.clone(), 3000);

        assert!(speaker.update_settings(|s| s.rate = 1.5));
        match service.handle(Request::GetSettings) {
            Response::Settings(settings) => {
                assert_eq!(settings.rate, 1.5);
                assert_eq!(settings.voice_name.as_deref(), Some("Alex"));
                assert_eq!(settings.pitch, 0.8);
                assert_eq!(settings.volume, 0.6);
            }
            other => panic!("unexpected response {:?}", other),
        }
    }
}
