//! Coordinator-level behavior tests
//!
//! Drives the announcer with a scripted speech backend and verifies the
//! baseline-channel policy: the learner always gets the text, speech is
//! additive, and every speech failure is absorbed into status.

use async_trait::async_trait;
use echolearn_app::announcer::Announcer;
use echolearn_app::fallback::{FallbackConfig, FallbackPresenter};
use echolearn_speech::{
    BackendEvent, ErrorKind, FailureReason, SpeechBackend, SpeechConfig, SpeechEngine,
    SpeechResult, UtteranceId, UtteranceRequest, VoiceInfo,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Backend whose event reporting is driven manually by each test.
struct ScriptedBackend {
    available: bool,
    requests: Mutex<Vec<UtteranceRequest>>,
    handles: Mutex<Vec<(UtteranceId, mpsc::Sender<BackendEvent>)>>,
}

impl ScriptedBackend {
    fn new(available: bool) -> Arc<Self> {
        Arc::new(Self {
            available,
            requests: Mutex::new(Vec::new()),
            handles: Mutex::new(Vec::new()),
        })
    }

    fn last_utterance(&self) -> (UtteranceId, mpsc::Sender<BackendEvent>) {
        self.handles
            .lock()
            .last()
            .cloned()
            .expect("no utterance was requested")
    }

    async fn report_started(&self) {
        let (id, tx) = self.last_utterance();
        let _ = tx.send(BackendEvent::Started { utterance_id: id }).await;
    }

    async fn report_finished(&self) {
        let (id, tx) = self.last_utterance();
        let _ = tx.send(BackendEvent::Finished { utterance_id: id }).await;
    }

    async fn report_failed(&self, reason: FailureReason) {
        let (id, tx) = self.last_utterance();
        let _ = tx
            .send(BackendEvent::Failed {
                utterance_id: id,
                reason,
            })
            .await;
    }

    fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl SpeechBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn probe(&self) -> bool {
        self.available
    }

    async fn list_voices(&self) -> SpeechResult<Vec<VoiceInfo>> {
        Ok(Vec::new())
    }

    async fn speak(
        &self,
        request: UtteranceRequest,
        events: mpsc::Sender<BackendEvent>,
    ) -> SpeechResult<()> {
        self.handles.lock().push((request.id, events));
        self.requests.lock().push(request);
        Ok(())
    }

    async fn cancel(&self) {}
}

async fn announcer_with(backend: Arc<ScriptedBackend>) -> Announcer {
    let (tx, rx) = mpsc::channel(32);
    let engine = SpeechEngine::new(backend, SpeechConfig::default(), tx).await;
    let announcer = Announcer::new(engine, FallbackPresenter::new(FallbackConfig::default()));
    announcer.spawn_event_pump(rx);
    announcer
}

/// Let the event pump task run.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn announce_always_shows_the_fallback_text() {
    let backend = ScriptedBackend::new(true);
    let announcer = announcer_with(Arc::clone(&backend)).await;

    announcer.announce("Meet amazing animals from around the world").await;
    let status = announcer.status();
    assert_eq!(
        status.fallback_text.as_deref(),
        Some("Meet amazing animals from around the world")
    );
    assert!(status.fallback_visible);
    assert!(status.is_speaking);
    assert!(status.is_supported);
}

#[tokio::test(start_paused = true)]
async fn unsupported_speech_still_delivers_text_and_never_hits_the_backend() {
    let backend = ScriptedBackend::new(false);
    let announcer = announcer_with(Arc::clone(&backend)).await;

    announcer.announce("content without audio").await;
    let status = announcer.status();
    assert!(!status.is_supported);
    assert!(!status.is_speaking);
    assert!(status.fallback_visible);
    assert_eq!(status.fallback_text.as_deref(), Some("content without audio"));
    assert_eq!(status.last_error, Some(ErrorKind::Unsupported));
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn completion_clears_speaking_and_keeps_the_text() {
    let backend = ScriptedBackend::new(true);
    let announcer = announcer_with(Arc::clone(&backend)).await;

    announcer.announce("a short fact").await;
    settle().await;
    backend.report_started().await;
    backend.report_finished().await;
    settle().await;

    let status = announcer.status();
    assert!(!status.is_speaking);
    assert!(status.last_error.is_none());
    assert!(status.fallback_visible, "text outlives the audio");
}

#[tokio::test(start_paused = true)]
async fn platform_error_is_absorbed_into_status() {
    let backend = ScriptedBackend::new(true);
    let announcer = announcer_with(Arc::clone(&backend)).await;

    announcer.announce("this will fail out loud").await;
    settle().await;
    backend.report_started().await;
    backend.report_failed(FailureReason::Network).await;
    settle().await;

    let status = announcer.status();
    assert!(!status.is_speaking);
    assert_eq!(
        status.last_error,
        Some(ErrorKind::Synthesis(FailureReason::Network))
    );
    // The learner still has the content.
    assert!(status.fallback_visible);
    assert_eq!(status.fallback_text.as_deref(), Some("this will fail out loud"));
}

#[tokio::test(start_paused = true)]
async fn silent_backend_is_caught_by_the_start_deadline() {
    let backend = ScriptedBackend::new(true);
    let announcer = announcer_with(Arc::clone(&backend)).await;

    announcer.announce("nobody will ever hear this").await;
    settle().await;
    assert!(announcer.status().is_speaking);

    // No backend event ever arrives; the start deadline (2s) fires.
    tokio::time::sleep(Duration::from_millis(2100)).await;
    settle().await;

    let status = announcer.status();
    assert!(!status.is_speaking);
    assert_eq!(status.last_error, Some(ErrorKind::StartTimeout));
    assert!(status.fallback_visible);

    // A subsequent announcement is not blocked.
    announcer.announce("try again").await;
    settle().await;
    assert!(announcer.status().is_speaking);
    assert_eq!(backend.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn newer_announcement_wins_and_stale_events_are_ignored() {
    let backend = ScriptedBackend::new(true);
    let announcer = announcer_with(Arc::clone(&backend)).await;

    announcer.announce("first").await;
    settle().await;
    backend.report_started().await;
    let (first_id, first_tx) = backend.last_utterance();

    announcer.announce("second").await;
    settle().await;
    backend.report_started().await;
    settle().await;

    let status = announcer.status();
    assert_eq!(status.fallback_text.as_deref(), Some("second"));
    assert!(status.is_speaking);

    // A late terminal event from the superseded utterance must not clear
    // the fresher speaking state.
    let _ = first_tx
        .send(BackendEvent::Finished {
            utterance_id: first_id,
        })
        .await;
    settle().await;
    assert!(announcer.status().is_speaking);

    backend.report_finished().await;
    settle().await;
    assert!(!announcer.status().is_speaking);
}

#[tokio::test(start_paused = true)]
async fn stop_speech_clears_speaking_but_not_the_text() {
    let backend = ScriptedBackend::new(true);
    let announcer = announcer_with(Arc::clone(&backend)).await;

    announcer.announce("interrupt me").await;
    settle().await;
    backend.report_started().await;
    settle().await;
    assert!(announcer.status().is_speaking);

    announcer.stop_speech().await;
    settle().await;
    let status = announcer.status();
    assert!(!status.is_speaking);
    assert!(status.last_error.is_none(), "cancellation is not an error");
    assert_eq!(status.fallback_text.as_deref(), Some("interrupt me"));
}

#[tokio::test(start_paused = true)]
async fn dismiss_fallback_is_independent_of_speech() {
    let backend = ScriptedBackend::new(true);
    let announcer = announcer_with(Arc::clone(&backend)).await;

    announcer.announce("read and close me").await;
    settle().await;
    backend.report_started().await;
    settle().await;

    announcer.dismiss_fallback();
    let status = announcer.status();
    assert!(!status.fallback_visible);
    assert_eq!(status.fallback_text, None);
    assert!(status.is_speaking, "speech keeps going");
}

#[tokio::test(start_paused = true)]
async fn item_announcement_spells_the_name() {
    let backend = ScriptedBackend::new(true);
    let announcer = announcer_with(Arc::clone(&backend)).await;

    announcer
        .announce_item("Dog", "Dogs have an amazing sense of smell, much better than humans!")
        .await;
    settle().await;

    let status = announcer.status();
    let text = status.fallback_text.expect("fallback must carry the item");
    assert!(text.contains("D, o, g"));
    assert!(text.contains("amazing sense of smell"));
    let spoken = backend.requests.lock();
    assert_eq!(spoken[0].text, text);
}

#[tokio::test(start_paused = true)]
async fn empty_announcements_are_ignored() {
    let backend = ScriptedBackend::new(true);
    let announcer = announcer_with(Arc::clone(&backend)).await;

    announcer.announce("   ").await;
    let status = announcer.status();
    assert!(!status.fallback_visible);
    assert!(!status.is_speaking);
    assert_eq!(backend.request_count(), 0);
}
