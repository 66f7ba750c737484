//! Voice Controller
//!
//! Keeps continuous speech recognition running while accessibility mode is
//! on and turns finalized utterances into navigator actions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::business::{Action, CommandDispatcher};
use crate::platform::{RecognitionError, RecognitionEvent, SpeechRecognizer};

type ActionCallback = Arc<dyn Fn(Action) + Send + Sync + 'static>;

/// Voice command controller
pub struct VoiceController {
    recognizer: Arc<dyn SpeechRecognizer>,
    dispatcher: Arc<CommandDispatcher>,
    language: String,
    is_listening: Arc<AtomicBool>,
    stop_signal: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
    on_action: Option<ActionCallback>,
    task: Option<JoinHandle<()>>,
}

impl VoiceController {
    /// Create a new voice controller
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        dispatcher: Arc<CommandDispatcher>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            recognizer,
            dispatcher,
            language: language.into(),
            is_listening: Arc::new(AtomicBool::new(false)),
            stop_signal: Arc::new(AtomicBool::new(false)),
            stop_notify: Arc::new(Notify::new()),
            on_action: None,
            task: None,
        }
    }

    /// Set action callback
    pub fn set_on_action<F>(&mut self, callback: F)
    where
        F: Fn(Action) + Send + Sync + 'static,
    {
        self.on_action = Some(Arc::new(callback));
    }

    /// Check if currently listening
    pub fn is_listening(&self) -> bool {
        self.is_listening.load(Ordering::SeqCst)
    }

    /// Start listening for voice commands
    pub async fn start(&mut self) -> Result<(), RecognitionError> {
        if self.is_listening() {
            return Ok(());
        }
        // A previous session may have ended on its own (permission loss).
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }

        tracing::info!("Starting voice recognition ({})...", self.language);
        let mut events = match self.recognizer.start(&self.language) {
            Ok(rx) => rx,
            Err(e) => {
                tracing::warn!("Voice recognition unavailable: {}", e);
                return Err(e);
            }
        };
        self.is_listening.store(true, Ordering::SeqCst);
        self.stop_signal.store(false, Ordering::SeqCst);
        // Fresh per session so a stale stop permit cannot end the new one.
        self.stop_notify = Arc::new(Notify::new());

        let recognizer = self.recognizer.clone();
        let dispatcher = self.dispatcher.clone();
        let language = self.language.clone();
        let is_listening = self.is_listening.clone();
        let stop_signal = self.stop_signal.clone();
        let stop_notify = self.stop_notify.clone();
        let on_action = self.on_action.clone();

        self.task = Some(tokio::spawn(async move {
            let mut utterances = 0u32;
            tracing::info!("Voice recognition task started");

            loop {
                let event = tokio::select! {
                    event = events.recv() => event,
                    _ = stop_notify.notified() => {
                        // A restart may have raced with stop().
                        recognizer.stop();
                        break;
                    }
                };
                match event {
                    Some(RecognitionEvent::Result {
                        transcript,
                        is_final: true,
                    }) => {
                        utterances += 1;
                        tracing::info!("[UTTERANCE #{}] {}", utterances, transcript);
                        if let Some(action) = dispatcher.dispatch(&transcript) {
                            if let Some(ref cb) = on_action {
                                cb(action);
                            }
                        }
                    }
                    Some(RecognitionEvent::Result { transcript, .. }) => {
                        tracing::trace!("[INTERIM] {}", transcript);
                    }
                    Some(RecognitionEvent::Error(e)) if e.is_permission_denied() => {
                        tracing::warn!("Voice recognition disabled: {}", e);
                        is_listening.store(false, Ordering::SeqCst);
                        recognizer.stop();
                        break;
                    }
                    Some(RecognitionEvent::Error(e)) => {
                        tracing::debug!("Recognition error: {}", e);
                    }
                    Some(RecognitionEvent::End) | None => {
                        if stop_signal.load(Ordering::SeqCst) || !is_listening.load(Ordering::SeqCst) {
                            break;
                        }
                        match recognizer.start(&language) {
                            Ok(rx) => {
                                if stop_signal.load(Ordering::SeqCst) {
                                    recognizer.stop();
                                    break;
                                }
                                tracing::debug!("Recognition session ended, restarted");
                                events = rx;
                            }
                            Err(e) => {
                                tracing::warn!("Could not restart voice recognition: {}", e);
                                is_listening.store(false, Ordering::SeqCst);
                                break;
                            }
                        }
                    }
                }
            }

            tracing::info!(
                "Voice recognition task finished ({} utterances)",
                utterances
            );
        }));

        Ok(())
    }

    /// Stop listening
    pub async fn stop(&mut self) {
        if !self.is_listening() && self.task.is_none() {
            return;
        }

        tracing::info!("Stopping voice recognition...");
        self.stop_signal.store(true, Ordering::SeqCst);
        self.is_listening.store(false, Ordering::SeqCst);
        self.recognizer.stop();
        self.stop_notify.notify_one();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Voice recognition task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ElementCategory;
    use crate::platform::{ChannelRecognizer, UtteranceFeeder};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn controller() -> (VoiceController, UtteranceFeeder, mpsc::UnboundedReceiver<Action>) {
        let (recognizer, feeder) = ChannelRecognizer::new();
        let mut controller = VoiceController::new(
            Arc::new(recognizer),
            Arc::new(CommandDispatcher::default()),
            "en-IN",
        );
        let (tx, rx) = mpsc::unbounded_channel();
        controller.set_on_action(move |action| {
            let _ = tx.send(action);
        });
        (controller, feeder, rx)
    }

    async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        check()
    }

    async fn next_action(rx: &mut mpsc::UnboundedReceiver<Action>) -> Option<Action> {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_utterances_become_actions() {
        let (mut controller, feeder, mut rx) = controller();
        controller.start().await.unwrap();
        assert!(controller.is_listening());

        feeder.say("Show me the links");
        feeder.say("blah blah");
        feeder.say("next");
        assert_eq!(
            next_action(&mut rx).await,
            Some(Action::ReadList(ElementCategory::Links))
        );
        assert_eq!(next_action(&mut rx).await, Some(Action::Next));

        controller.stop().await;
        assert!(!controller.is_listening());
        assert!(!feeder.is_listening());
    }

    #[tokio::test]
    async fn test_interim_results_ignored() {
        let (mut controller, feeder, mut rx) = controller();
        controller.start().await.unwrap();
        feeder.emit(RecognitionEvent::Result {
            transcript: "next".into(),
            is_final: false,
        });
        feeder.say("previous");
        assert_eq!(next_action(&mut rx).await, Some(Action::Previous));
        controller.stop().await;
    }

    #[tokio::test]
    async fn test_restarts_after_session_end() {
        let (mut controller, feeder, mut rx) = controller();
        controller.start().await.unwrap();

        feeder.emit(RecognitionEvent::End);
        assert!(eventually(|| feeder.is_listening()).await);
        assert!(controller.is_listening());

        feeder.say("zoom");
        assert_eq!(next_action(&mut rx).await, Some(Action::ToggleMagnifier));
        controller.stop().await;
    }

    #[tokio::test]
    async fn test_permission_denied_stops_without_restart() {
        let (mut controller, feeder, _rx) = controller();
        controller.start().await.unwrap();

        feeder.emit(RecognitionEvent::Error(RecognitionError::NotAllowed));
        assert!(eventually(|| !controller.is_listening()).await);
        assert!(!feeder.is_listening());

        // Stays stopped until explicitly started again.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!feeder.is_listening());

        controller.start().await.unwrap();
        assert!(controller.is_listening());
        controller.stop().await;
    }

    #[tokio::test]
    async fn test_non_fatal_errors_keep_listening() {
        let (mut controller, feeder, mut rx) = controller();
        controller.start().await.unwrap();
        feeder.emit(RecognitionEvent::Error(RecognitionError::NoSpeech));
        feeder.say("read");
        assert_eq!(next_action(&mut rx).await, Some(Action::ReadParagraph));
        assert!(controller.is_listening());
        controller.stop().await;
    }

    /// Recognizer whose restarts block for a while, like a host that is
    /// slow to reopen the microphone.
    struct SlowRestartRecognizer {
        inner: ChannelRecognizer,
        starts: AtomicUsize,
    }

    impl SpeechRecognizer for SlowRestartRecognizer {
        fn start(
            &self,
            language: &str,
        ) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>, RecognitionError> {
            if self.starts.fetch_add(1, Ordering::SeqCst) > 0 {
                std::thread::sleep(Duration::from_millis(200));
            }
            self.inner.start(language)
        }

        fn stop(&self) {
            self.inner.stop();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_during_restart_ends_session() {
        let (inner, feeder) = ChannelRecognizer::new();
        let recognizer = Arc::new(SlowRestartRecognizer {
            inner,
            starts: AtomicUsize::new(0),
        });
        let mut controller = VoiceController::new(
            recognizer.clone(),
            Arc::new(CommandDispatcher::default()),
            "en-IN",
        );
        controller.start().await.unwrap();

        feeder.emit(RecognitionEvent::End);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let stopped = tokio::time::timeout(Duration::from_secs(2), controller.stop()).await;
        assert!(stopped.is_ok());
        assert_eq!(recognizer.starts.load(Ordering::SeqCst), 2);
        assert!(!feeder.is_listening());
        assert!(!controller.is_listening());
    }

    #[tokio::test]
    async fn test_stop_then_restart_listens_again() {
        let (mut controller, feeder, mut rx) = controller();
        controller.start().await.unwrap();
        controller.stop().await;
        controller.start().await.unwrap();

        // The first session's stop must not end the second one.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(feeder.is_listening());
        feeder.say("next");
        assert_eq!(next_action(&mut rx).await, Some(Action::Next));
        controller.stop().await;
    }

    #[tokio::test]
    async fn test_unavailable_recognizer() {
        let mut controller = VoiceController::new(
            Arc::new(ChannelRecognizer::unavailable()),
            Arc::new(CommandDispatcher::default()),
            "en-IN",
        );
        assert_eq!(controller.start().await, Err(RecognitionError::Unsupported));
        assert!(!controller.is_listening());
        controller.stop().await;
    }
}
