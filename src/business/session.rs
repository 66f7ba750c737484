//! Accessibility Session
//!
//! Single owner of all per-page state. Every input (popup commands, key
//! presses, voice actions, pointer moves, heading-map clicks) arrives as a
//! [`SessionEvent`] and is handled to completion before the next one.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::business::{
    Action, CommandDispatcher, KeyInput, KeyMap, Navigator, SentencePlayer, Speaker,
    VisualAids, VoiceController,
};
use crate::data::{AppConfig, Command};
use crate::page::{enhance_link_labels, enhance_screen_reader, Page, PageScanner};
use crate::platform::SpeechRecognizer;

/// Input delivered to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Command(Command),
    Key(KeyInput),
    Voice(Action),
    PointerMove { x: f64, y: f64 },
    HeadingMapClick(usize),
    Shutdown,
}

pub struct AccessibilitySession {
    page: Arc<dyn Page>,
    speaker: Arc<Speaker>,
    navigator: Navigator,
    player: SentencePlayer,
    aids: VisualAids,
    keymap: KeyMap,
    voice: VoiceController,
    focus_trap_armed: bool,
    activate_on_load: bool,
    sender: mpsc::UnboundedSender<SessionEvent>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl AccessibilitySession {
    /// Builds the session for a freshly loaded page and runs the enhancers.
    pub fn new(
        page: Arc<dyn Page>,
        speaker: Arc<Speaker>,
        recognizer: Arc<dyn SpeechRecognizer>,
        config: &AppConfig,
    ) -> Self {
        let (sender, events) = mpsc::unbounded_channel();

        let mut voice = VoiceController::new(
            recognizer,
            Arc::new(CommandDispatcher::default()),
            config.general.language.clone(),
        );
        let voice_tx = sender.clone();
        voice.set_on_action(move |action| {
            if voice_tx.send(SessionEvent::Voice(action)).is_err() {
                tracing::debug!("Session closed, dropping voice action {:?}", action);
            }
        });

        let session = Self {
            navigator: Navigator::new(page.clone(), speaker.clone()),
            player: SentencePlayer::new(page.clone(), speaker.clone(), config.playback.clone()),
            aids: VisualAids::new(
                page.clone(),
                speaker.clone(),
                config.magnifier.clone(),
                config.heading_map.clone(),
            ),
            keymap: KeyMap::new(&config.keys),
            voice,
            focus_trap_armed: false,
            activate_on_load: config.general.activate_on_load,
            sender,
            events,
            page,
            speaker,
        };
        session.enhance_page();
        session
    }

    /// Handle for feeding events into [`run`](Self::run).
    pub fn sender(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.sender.clone()
    }

    pub fn is_active(&self) -> bool {
        self.navigator.session().is_active()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn aids(&self) -> &VisualAids {
        &self.aids
    }

    pub fn player_mut(&mut self) -> &mut SentencePlayer {
        &mut self.player
    }

    pub fn is_listening(&self) -> bool {
        self.voice.is_listening()
    }

    /// Processes events until [`SessionEvent::Shutdown`].
    pub async fn run(mut self) {
        tracing::info!("Accessibility session running");
        if self.activate_on_load {
            self.handle(SessionEvent::Command(Command::Start)).await;
        }

        while let Some(event) = self.events.recv().await {
            if !self.handle(event).await {
                break;
            }
        }

        self.voice.stop().await;
        self.player.cancel().await;
        tracing::info!("Accessibility session finished");
    }

    /// Handles one event. Returns `false` once the session should end.
    pub async fn handle(&mut self, event: SessionEvent) -> bool {
        tracing::debug!("Session event: {:?}", event);
        match event {
            SessionEvent::Command(command) => self.handle_command(command).await,
            SessionEvent::Key(input) => self.handle_key(input).await,
            SessionEvent::Voice(action) => {
                if self.is_active() {
                    self.perform(action).await;
                }
            }
            SessionEvent::PointerMove { x, y } => self.aids.pointer_moved(x, y),
            SessionEvent::HeadingMapClick(index) => match self.aids.heading_map_target(index) {
                Some(heading) => self.navigator.focus(heading),
                None => tracing::debug!("No heading-map entry at {}", index),
            },
            SessionEvent::Shutdown => return false,
        }
        true
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start => self.start().await,
            Command::Stop => self.stop().await,
            Command::ToggleContrast => {
                self.aids.toggle_contrast();
            }
            Command::ToggleHeadingMap => {
                self.aids.toggle_heading_map();
            }
            Command::ToggleMagnifier => {
                self.aids.toggle_magnifier();
            }
            Command::SetVoiceRate { rate } => {
                let rate = rate.filter(|r| r.is_finite() && *r > 0.0).unwrap_or(1.0);
                if !self.speaker.update_settings(|s| s.rate = rate) {
                    tracing::error!("Could not store voice rate {}", rate);
                }
            }
            Command::SetVoiceName { name } => {
                let name = name.unwrap_or_default();
                if !self.speaker.update_settings(|s| s.voice_name = Some(name)) {
                    tracing::error!("Could not store voice name");
                }
            }
        }
    }

    async fn start(&mut self) {
        self.navigator.set_active(true);
        self.speaker.speak("Accessibility mode activated.");
        self.enhance_page();
        let elements = PageScanner::scan(self.page.as_ref());
        tracing::info!(
            "Accessibility mode activated ({} headings, {} links, {} buttons)",
            elements.headings.len(),
            elements.links.len(),
            elements.buttons.len()
        );
        self.focus_trap_armed = true;
        if let Err(e) = self.voice.start().await {
            tracing::warn!("Voice commands disabled: {}", e);
        }
    }

    async fn stop(&mut self) {
        tracing::info!("Accessibility mode stopped");
        self.navigator.set_active(false);
        self.speaker.speak("Accessibility mode stopped.");
        self.voice.stop().await;
        self.navigator.clear_highlight();
        self.aids.reset();
        self.focus_trap_armed = false;
    }

    async fn handle_key(&mut self, input: KeyInput) {
        if input.is_tab() && self.focus_trap_armed {
            self.focus_trap_armed = false;
            if let Some(body) = self.page.body() {
                self.page.set_attribute(body, "tabindex", "-1");
                tracing::debug!("Focus trap fix applied");
            }
        }
        if !self.is_active() {
            return;
        }
        if let Some(action) = self.keymap.resolve(&input) {
            self.perform(action).await;
        }
    }

    async fn perform(&mut self, action: Action) {
        match action {
            Action::ReadList(category) => self.navigator.select_category(category),
            Action::Next => self.navigator.next(),
            Action::Previous => self.navigator.previous(),
            Action::ReadParagraph => {
                let last_read = self.navigator.session().last_read();
                self.player.play_paragraph(last_read).await;
            }
            Action::ToggleContrast => {
                self.aids.toggle_contrast();
            }
            Action::ToggleHeadingMap => {
                self.aids.toggle_heading_map();
            }
            Action::ToggleMagnifier => {
                self.aids.toggle_magnifier();
            }
        }
    }

    fn enhance_page(&self) {
        enhance_screen_reader(self.page.as_ref());
        enhance_link_labels(self.page.as_ref());
    }
}
