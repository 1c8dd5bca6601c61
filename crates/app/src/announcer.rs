//! Announcement coordinator
//!
//! The single entry point the rest of the app uses to say something to the
//! learner. The visible fallback is the reliable baseline channel and is
//! always updated first; speech is a best-effort enhancement on top. All
//! speech failures are absorbed into status here; callers never see them,
//! because the content has already been delivered as text.

use crate::fallback::FallbackPresenter;
use echolearn_speech::{ErrorKind, FailureReason, SpeechEngine, SpeechEvent, UtteranceId};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Point-in-time view of the announcement subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncerStatus {
    pub is_speaking: bool,
    pub is_supported: bool,
    pub last_error: Option<ErrorKind>,
    pub fallback_text: Option<String>,
    pub fallback_visible: bool,
}

#[derive(Default)]
struct SpeakState {
    is_speaking: bool,
    last_error: Option<ErrorKind>,
    /// Utterance the announcer currently cares about; 0 = none. Events
    /// older than this are stale and ignored.
    current: UtteranceId,
    /// Highest utterance id with a pumped terminal event. Lets a request
    /// whose terminal event raced ahead of the bookkeeping be recognized
    /// as already over.
    finished: UtteranceId,
}

#[derive(Clone)]
pub struct Announcer {
    inner: Arc<Inner>,
}

struct Inner {
    engine: SpeechEngine,
    fallback: FallbackPresenter,
    speak: RwLock<SpeakState>,
}

impl Announcer {
    pub fn new(engine: SpeechEngine, fallback: FallbackPresenter) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                fallback,
                speak: RwLock::new(SpeakState::default()),
            }),
        }
    }

    /// Consume engine events, keeping status current. Runs until the engine
    /// side of the channel closes.
    pub fn spawn_event_pump(&self, mut events: mpsc::Receiver<SpeechEvent>) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                inner.apply(event);
            }
            debug!("speech event channel closed, announcer pump exiting");
        })
    }

    /// Deliver `text` to the learner. The fallback text is shown
    /// unconditionally; speech is attempted only where supported, and any
    /// speech error is absorbed into `status().last_error`.
    pub async fn announce(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.inner.fallback.show(text);
        self.inner.speak.write().last_error = None;

        if !self.inner.engine.is_supported() {
            self.inner.speak.write().last_error = Some(ErrorKind::Unsupported);
            debug!("speech unsupported, fallback only");
            return;
        }

        match self.inner.engine.speak(text).await {
            Ok(id) => self.inner.record_request(id),
            Err(e) => {
                warn!("announcement will be text-only: {}", e);
                let mut speak = self.inner.speak.write();
                speak.is_speaking = false;
                speak.last_error = Some(ErrorKind::Synthesis(FailureReason::Other(e.to_string())));
            }
        }
    }

    /// Announce a learning item: pronounce the name, spell it letter by
    /// letter, then read the fact, as one utterance.
    pub async fn announce_item(&self, name: &str, fact: &str) {
        self.announce(&compose_item_text(name, fact)).await;
    }

    /// Hide and clear the fallback text. Independent of whether speech is
    /// still running.
    pub fn dismiss_fallback(&self) {
        self.inner.fallback.dismiss();
    }

    /// Cancel any in-flight speech. The fallback stays as it is.
    pub async fn stop_speech(&self) {
        self.inner.engine.stop().await;
        let mut speak = self.inner.speak.write();
        speak.is_speaking = false;
        speak.current = 0;
    }

    pub fn status(&self) -> AnnouncerStatus {
        let (fallback_text, fallback_visible) = self.inner.fallback.snapshot();
        let speak = self.inner.speak.read();
        AnnouncerStatus {
            is_speaking: speak.is_speaking,
            is_supported: self.inner.engine.is_supported(),
            last_error: speak.last_error.clone(),
            fallback_text,
            fallback_visible,
        }
    }
}

impl Inner {
    fn apply(&self, event: SpeechEvent) {
        let mut speak = self.speak.write();
        let id = event.utterance_id();
        // Ids are monotonic: anything older than the tracked utterance, or
        // already terminated, is stale. A terminal event for a NEWER id is
        // legitimate: the pump can outrun `record_request`.
        if id < speak.current || id <= speak.finished {
            debug!(utterance_id = id, "ignoring stale speech event");
            return;
        }
        match event {
            SpeechEvent::Started { .. } => {
                if id == speak.current {
                    speak.is_speaking = true;
                }
            }
            SpeechEvent::Completed { .. } | SpeechEvent::Cancelled { .. } => {
                speak.finished = id;
                speak.is_speaking = false;
                speak.current = 0;
            }
            SpeechEvent::Failed { kind, utterance_id } => {
                warn!(utterance_id, %kind, "speech failed, learner has the text fallback");
                speak.finished = id;
                speak.is_speaking = false;
                speak.current = 0;
                speak.last_error = Some(kind);
            }
        }
    }

    /// Record a freshly requested utterance. Its terminal event may already
    /// have been pumped before the request call returned; such an utterance
    /// is over and must not be marked speaking.
    fn record_request(&self, id: UtteranceId) {
        let mut speak = self.speak.write();
        if speak.finished >= id {
            speak.current = 0;
        } else {
            speak.is_speaking = true;
            speak.current = id;
        }
    }
}

/// Build the composite utterance for a learning item.
pub fn compose_item_text(name: &str, fact: &str) -> String {
    let spelled = name
        .chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{name}. Let me spell that for you: {spelled}. Here's a fun fact: {fact}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackConfig;
    use echolearn_speech::{
        BackendEvent, SpeechBackend, SpeechConfig, SpeechResult, UtteranceRequest, VoiceInfo,
    };

    struct InertBackend;

    #[async_trait::async_trait]
    impl SpeechBackend for InertBackend {
        fn name(&self) -> &str {
            "inert"
        }
        async fn probe(&self) -> bool {
            true
        }
        async fn list_voices(&self) -> SpeechResult<Vec<VoiceInfo>> {
            Ok(Vec::new())
        }
        async fn speak(
            &self,
            _request: UtteranceRequest,
            _events: mpsc::Sender<BackendEvent>,
        ) -> SpeechResult<()> {
            Ok(())
        }
        async fn cancel(&self) {}
    }

    async fn announcer() -> Announcer {
        let (tx, _rx) = mpsc::channel(32);
        let engine = SpeechEngine::new(Arc::new(InertBackend), SpeechConfig::default(), tx).await;
        Announcer::new(engine, FallbackPresenter::new(FallbackConfig::default()))
    }

    #[tokio::test]
    async fn terminal_event_racing_the_request_is_not_lost() {
        let announcer = announcer().await;

        // On a multi-threaded runtime the pump can apply the terminal event
        // before the requesting call records the utterance id.
        announcer.inner.apply(SpeechEvent::Failed {
            utterance_id: 7,
            kind: ErrorKind::StartTimeout,
        });
        announcer.inner.record_request(7);

        let status = announcer.status();
        assert!(!status.is_speaking, "utterance already ended");
        assert_eq!(status.last_error, Some(ErrorKind::StartTimeout));
    }

    #[tokio::test]
    async fn request_without_a_raced_event_is_marked_speaking() {
        let announcer = announcer().await;

        announcer.inner.record_request(9);
        assert!(announcer.status().is_speaking);

        announcer.inner.apply(SpeechEvent::Completed { utterance_id: 9 });
        assert!(!announcer.status().is_speaking);
    }

    #[test]
    fn item_text_spells_the_name_out() {
        let text = compose_item_text("Dog", "Dogs have an amazing sense of smell!");
        assert!(text.starts_with("Dog. "));
        assert!(text.contains("D, o, g"));
        assert!(text.ends_with("Here's a fun fact: Dogs have an amazing sense of smell!"));
    }

    #[test]
    fn single_letter_names_have_no_separator() {
        let text = compose_item_text("A", "A is for Apple!");
        assert!(text.contains("Let me spell that for you: A."));
    }
}
