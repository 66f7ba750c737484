//! Console speech backends
//!
//! `ConsoleSynthesizer` prints what would be spoken. `ChannelRecognizer`
//! turns text fed through an [`UtteranceFeeder`] into recognition events,
//! which is how the CLI (and the tests) stand in for a microphone.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

use super::{RecognitionError, RecognitionEvent, SpeechRecognizer, SpeechSynthesizer, SynthesisError};
use crate::data::SpeakRequest;

pub struct ConsoleSynthesizer;

impl ConsoleSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn speak(&self, request: &SpeakRequest) -> Result<(), SynthesisError> {
        tracing::debug!(
            "TTS voice={:?} rate={} pitch={} volume={}",
            request.options.voice_name,
            request.options.rate,
            request.options.pitch,
            request.options.volume
        );
        println!("🔊 {}", request.text);
        Ok(())
    }
}

type SessionSlot = Arc<Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>>;

/// Recognizer fed from an in-process channel.
pub struct ChannelRecognizer {
    session: SessionSlot,
    available: bool,
}

/// Handle used to inject speech into a [`ChannelRecognizer`].
#[derive(Clone)]
pub struct UtteranceFeeder {
    session: SessionSlot,
}

impl ChannelRecognizer {
    pub fn new() -> (Self, UtteranceFeeder) {
        let session: SessionSlot = Arc::new(Mutex::new(None));
        (
            Self {
                session: session.clone(),
                available: true,
            },
            UtteranceFeeder { session },
        )
    }

    /// A recognizer that reports recognition as unsupported.
    pub fn unavailable() -> Self {
        Self {
            session: Arc::new(Mutex::new(None)),
            available: false,
        }
    }
}

impl SpeechRecognizer for ChannelRecognizer {
    fn start(&self, language: &str) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>, RecognitionError> {
        if !self.available {
            return Err(RecognitionError::Unsupported);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(tx) {
            let _ = previous.send(RecognitionEvent::End);
        }
        tracing::debug!("Channel recognizer session started ({})", language);
        Ok(rx)
    }

    fn stop(&self) {
        let previous = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = previous {
            let _ = tx.send(RecognitionEvent::End);
        }
    }
}

impl UtteranceFeeder {
    /// Delivers a finalized utterance. Returns false when no session is running.
    pub fn say(&self, transcript: &str) -> bool {
        self.emit(RecognitionEvent::Result {
            transcript: transcript.to_string(),
            is_final: true,
        })
    }

    /// Delivers a raw event. `End` and errors behave as the host would
    /// report them: `End` closes the current session.
    pub fn emit(&self, event: RecognitionEvent) -> bool {
        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let ends_session = matches!(event, RecognitionEvent::End);
        let delivered = slot
            .as_ref()
            .map(|tx| tx.send(event).is_ok())
            .unwrap_or(false);
        if ends_session {
            slot.take();
        }
        delivered
    }

    pub fn is_listening(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_feeder_delivers_to_active_session() {
        let (recognizer, feeder) = ChannelRecognizer::new();
        assert!(!feeder.say("ignored"));

        let mut rx = recognizer.start("en-IN").unwrap();
        assert!(feeder.say("next"));
        assert_eq!(
            rx.recv().await,
            Some(RecognitionEvent::Result {
                transcript: "next".into(),
                is_final: true
            })
        );

        recognizer.stop();
        assert_eq!(rx.recv().await, Some(RecognitionEvent::End));
        assert_eq!(rx.recv().await, None);
        assert!(!feeder.is_listening());
    }

    #[test]
    fn test_unavailable() {
        let recognizer = ChannelRecognizer::unavailable();
        assert_eq!(recognizer.start("en-IN").err(), Some(RecognitionError::Unsupported));
    }
}
