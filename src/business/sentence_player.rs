//! Sentence Player
//!
//! Reads the paragraph around the last focused element one sentence at a
//! time, highlighting each sentence while it is spoken.

use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::business::Speaker;
use crate::data::PlaybackConfig;
use crate::page::{ElementRef, Page};

/// Marker class of the sentence being read.
pub const SENTENCE_CLASS: &str = "blind-nav-highlight-sentence";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Cancelled,
}

struct Playback {
    cancel: Arc<Notify>,
    handle: JoinHandle<PlaybackOutcome>,
}

pub struct SentencePlayer {
    page: Arc<dyn Page>,
    speaker: Arc<Speaker>,
    timing: PlaybackConfig,
    current: Option<Playback>,
}

impl SentencePlayer {
    pub fn new(page: Arc<dyn Page>, speaker: Arc<Speaker>, timing: PlaybackConfig) -> Self {
        Self {
            page,
            speaker,
            timing,
            current: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current
            .as_ref()
            .map(|p| !p.handle.is_finished())
            .unwrap_or(false)
    }

    /// Starts reading the paragraph nearest to `last_read`. Any playback
    /// already in flight is cancelled (and its highlights removed) first.
    /// Returns whether playback started.
    pub async fn play_paragraph(&mut self, last_read: Option<ElementRef>) -> bool {
        let Some(node) = last_read else {
            self.speaker
                .speak("No element selected. Say headings or links first.");
            return false;
        };
        let Some(paragraph) = find_paragraph(self.page.as_ref(), node) else {
            self.speaker.speak("No paragraph found nearby.");
            return false;
        };

        let text = self.page.inner_text(paragraph).unwrap_or_default();
        let sentences = split_sentences(&text);

        if let Some(PlaybackOutcome::Cancelled) = self.cancel().await {
            tracing::debug!("Previous paragraph playback cancelled");
        }

        tracing::info!("Reading paragraph {} ({} sentences)", paragraph, sentences.len());
        let cancel = Arc::new(Notify::new());
        let handle = tokio::spawn(run_playback(
            self.page.clone(),
            self.speaker.clone(),
            self.timing.clone(),
            paragraph,
            sentences,
            cancel.clone(),
        ));
        self.current = Some(Playback { cancel, handle });
        true
    }

    /// Cancels the in-flight playback and waits for its cleanup.
    pub async fn cancel(&mut self) -> Option<PlaybackOutcome> {
        let playback = self.current.take()?;
        playback.cancel.notify_one();
        Self::join(playback).await
    }

    /// Waits for the in-flight playback to finish on its own.
    pub async fn wait(&mut self) -> Option<PlaybackOutcome> {
        let playback = self.current.take()?;
        Self::join(playback).await
    }

    async fn join(playback: Playback) -> Option<PlaybackOutcome> {
        match playback.handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!("Paragraph playback task failed: {}", e);
                None
            }
        }
    }
}

async fn run_playback(
    page: Arc<dyn Page>,
    speaker: Arc<Speaker>,
    timing: PlaybackConfig,
    container: ElementRef,
    sentences: Vec<String>,
    cancel: Arc<Notify>,
) -> PlaybackOutcome {
    let mut outcome = PlaybackOutcome::Completed;

    for sentence in &sentences {
        if !page.mark_text(container, sentence, SENTENCE_CLASS) {
            tracing::debug!("Sentence not found as a single text run: {:?}", sentence);
        }
        speaker.speak(sentence);

        tokio::select! {
            _ = tokio::time::sleep(timing.sentence_delay(sentence)) => {}
            _ = cancel.notified() => {
                outcome = PlaybackOutcome::Cancelled;
                break;
            }
        }
    }

    page.unmark_text(container, SENTENCE_CLASS);
    outcome
}

/// Nearest paragraph: enclosing, contained, first in an article, first in
/// the document.
pub fn find_paragraph(page: &dyn Page, node: ElementRef) -> Option<ElementRef> {
    page.closest(node, "p")
        .or_else(|| page.query_within(node, "p"))
        .or_else(|| page.query_first("article p"))
        .or_else(|| page.query_first("p"))
}

/// Splits after `.`, `!` or `?` when followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let end = i + ch.len_utf8();
        if !matches!(chars.peek(), Some((_, next)) if next.is_whitespace()) {
            continue;
        }
        sentences.push(&text[start..end]);
        while let Some(&(_, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            chars.next();
        }
        start = chars.peek().map(|&(j, _)| j).unwrap_or(text.len());
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
