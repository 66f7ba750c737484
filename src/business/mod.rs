//! Business logic module

mod command_dispatcher;
mod keyboard;
mod navigator;
mod sanitizer;
mod sentence_player;
mod session;
pub(crate) mod speech;
mod visual_aids;
mod voice_controller;

pub use command_dispatcher::{Action, CommandDispatcher, CommandRule, DEFAULT_RULES};
pub use keyboard::{KeyInput, KeyMap};
pub use navigator::{describe, NavigationSession, Navigator, HIGHLIGHT_CLASS};
pub use sanitizer::{sanitize_text, DEFAULT_MAX_CHARS};
pub use sentence_player::{
    find_paragraph, split_sentences, PlaybackOutcome, SentencePlayer, SENTENCE_CLASS,
};
pub use session::{AccessibilitySession, SessionEvent};
pub use speech::{Speaker, SpeechService};
pub use visual_aids::{VisualAids, CONTRAST_CLASS, HEADING_MAP_ID, HEADING_TARGET_ATTR, LENS_ID};
pub use voice_controller::VoiceController;
