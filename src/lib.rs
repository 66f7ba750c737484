//! Blind Navigator - keyboard and voice page navigation
//!
//! Scans a page for headings, links and buttons, walks through them one at
//! a time while reading each aloud, plays paragraphs sentence by sentence,
//! and offers visual aids (high contrast, magnifier lens, heading map).
//! Page access, speech output and speech recognition sit behind traits so
//! the engine runs against any host.

pub mod business;
pub mod data;
pub mod page;
pub mod platform;

pub use business::{AccessibilitySession, Action, SessionEvent, Speaker, SpeechService};
pub use data::{AppConfig, Command, FileSettingsStore, Settings};
pub use page::{ElementRef, InMemoryPage, Page, PageOutline};
pub use platform::PlatformFactory;
