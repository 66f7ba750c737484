use thiserror::Error;
use tokio::sync::mpsc;

use crate::data::SpeakRequest;

mod console;

pub use console::{ChannelRecognizer, ConsoleSynthesizer, UtteranceFeeder};

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Speech synthesis unavailable")]
    Unavailable,

    #[error("Speech synthesis failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("Speech recognition is not supported")]
    Unsupported,

    #[error("Microphone permission denied")]
    NotAllowed,

    #[error("Speech recognition service not allowed")]
    ServiceNotAllowed,

    #[error("No speech detected")]
    NoSpeech,

    #[error("Recognition failed: {0}")]
    Other(String),
}

impl RecognitionError {
    /// Errors after which recognition must not be restarted.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::NotAllowed | Self::ServiceNotAllowed)
    }
}

/// Event produced by a running recognition session.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Result { transcript: String, is_final: bool },
    Error(RecognitionError),
    /// The session ended; a new `start` is needed to keep listening.
    End,
}

/// Trait for host text-to-speech
pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, request: &SpeakRequest) -> Result<(), SynthesisError>;
}

/// Trait for host continuous speech recognition
pub trait SpeechRecognizer: Send + Sync {
    /// Start a recognition session in `language`.
    fn start(&self, language: &str) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>, RecognitionError>;
    /// Stop the current session. It still reports `End`.
    fn stop(&self);
}

/// Factory for creating platform implementations
pub struct PlatformFactory;

impl PlatformFactory {
    pub fn create_synthesizer() -> Box<dyn SpeechSynthesizer> {
        Box::new(ConsoleSynthesizer::new())
    }

    pub fn create_recognizer() -> (ChannelRecognizer, UtteranceFeeder) {
        ChannelRecognizer::new()
    }
}
