//! Utterance engine: single active slot, last-request-wins, bounded waits
//!
//! The engine drives one utterance at a time through the state machine
//! `Idle -> Requested -> Speaking -> {Completed | Failed | Cancelled}`.
//! A new `speak` always cancels the in-flight utterance first; there is no
//! queue. Two deadlines guard against platforms that fail by silence: a
//! start deadline (requested but never began) and a completion deadline
//! scaled by text length (began but never ended).

use crate::backend::{BackendEvent, SpeechBackend};
use crate::error::{ErrorKind, FailureReason, SpeechError, SpeechResult};
use crate::types::{SpeechConfig, UtteranceRequest, VoiceGender, VoiceInfo};
use crate::{next_utterance_id, UtteranceId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Engine-level utterance events, delivered to the announcement layer.
///
/// At most one terminal event (`Completed`, `Failed`, `Cancelled`) is
/// emitted per utterance, and events from superseded utterances are dropped
/// rather than forwarded.
#[derive(Debug, Clone)]
pub enum SpeechEvent {
    Started { utterance_id: UtteranceId },
    Completed { utterance_id: UtteranceId },
    Failed {
        utterance_id: UtteranceId,
        kind: ErrorKind,
    },
    Cancelled { utterance_id: UtteranceId },
}

impl SpeechEvent {
    pub fn utterance_id(&self) -> UtteranceId {
        match self {
            SpeechEvent::Started { utterance_id }
            | SpeechEvent::Completed { utterance_id }
            | SpeechEvent::Failed { utterance_id, .. }
            | SpeechEvent::Cancelled { utterance_id } => *utterance_id,
        }
    }
}

/// Where the active utterance currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtterancePhase {
    Idle,
    Requested,
    Speaking,
}

/// Name fragments the voice heuristic treats as friendly for young
/// listeners, checked case-insensitively against voice names.
const FRIENDLY_NAME_HINTS: &[&str] = &["female", "samantha", "karen", "victoria", "zira", "susan"];

struct ActiveSlot {
    utterance_id: UtteranceId,
    phase: UtterancePhase,
    driver: Option<JoinHandle<()>>,
}

enum VoiceChoice {
    Unresolved,
    Resolved(Option<String>),
}

/// Owns the single active utterance slot. Audio-only: never touches any
/// visual or fallback state.
pub struct SpeechEngine {
    backend: Arc<dyn SpeechBackend>,
    config: SpeechConfig,
    supported: bool,
    events: mpsc::Sender<SpeechEvent>,
    slot: Arc<Mutex<ActiveSlot>>,
    voice: Arc<Mutex<VoiceChoice>>,
}

impl SpeechEngine {
    /// Probe the backend once and build the engine. Capability detection
    /// does not change for the rest of the session.
    pub async fn new(
        backend: Arc<dyn SpeechBackend>,
        config: SpeechConfig,
        events: mpsc::Sender<SpeechEvent>,
    ) -> Self {
        let supported = config.enabled && backend.probe().await;
        if !supported {
            warn!(
                backend = backend.name(),
                enabled = config.enabled,
                "speech synthesis unavailable, text fallback only"
            );
        } else {
            debug!(backend = backend.name(), "speech backend ready");
        }
        Self {
            backend,
            config,
            supported,
            events,
            slot: Arc::new(Mutex::new(ActiveSlot {
                utterance_id: 0,
                phase: UtterancePhase::Idle,
                driver: None,
            })),
            voice: Arc::new(Mutex::new(VoiceChoice::Unresolved)),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    pub fn phase(&self) -> UtterancePhase {
        self.slot.lock().phase
    }

    /// Speak `text`, cancelling any in-flight utterance first.
    ///
    /// Returns the id of the new utterance; its progress arrives on the
    /// event channel. Errors here mean the request was never initiated;
    /// everything after initiation is reported as events.
    pub async fn speak(&self, text: &str) -> SpeechResult<UtteranceId> {
        if !self.supported {
            return Err(SpeechError::Unsupported);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        self.cancel_active().await;

        let id = next_utterance_id();
        {
            let mut slot = self.slot.lock();
            slot.utterance_id = id;
            slot.phase = UtterancePhase::Requested;
        }

        let request = UtteranceRequest {
            id,
            text: text.to_string(),
            voice: self.resolve_voice().await,
            language: self.config.language.clone(),
            rate: self.config.rate,
            pitch: self.config.pitch,
            volume: self.config.volume,
        };

        debug!(utterance_id = id, chars = text.len(), "speak requested");
        let driver = tokio::spawn(drive_utterance(
            Arc::clone(&self.backend),
            request,
            self.config.clone(),
            Arc::clone(&self.slot),
            self.events.clone(),
        ));

        let mut slot = self.slot.lock();
        // The driver may already have finished and released the slot.
        if slot.utterance_id == id && slot.phase != UtterancePhase::Idle {
            slot.driver = Some(driver);
        }
        Ok(id)
    }

    /// Cancel the active utterance, if any. Idempotent. The cancelled
    /// utterance's callbacks will not fire afterward; a single `Cancelled`
    /// event is emitted instead.
    pub async fn stop(&self) {
        self.cancel_active().await;
    }

    async fn cancel_active(&self) {
        let (cancelled_id, driver) = {
            let mut slot = self.slot.lock();
            if slot.phase == UtterancePhase::Idle {
                return;
            }
            let id = slot.utterance_id;
            slot.phase = UtterancePhase::Idle;
            (id, slot.driver.take())
        };
        if let Some(driver) = driver {
            driver.abort();
        }
        self.backend.cancel().await;
        debug!(utterance_id = cancelled_id, "utterance cancelled");
        let _ = self
            .events
            .send(SpeechEvent::Cancelled {
                utterance_id: cancelled_id,
            })
            .await;
    }

    /// Resolve the voice to use, waiting a bounded time for the backend
    /// voice list on first use. On timeout the engine proceeds with no
    /// explicit voice and retries resolution on the next utterance.
    async fn resolve_voice(&self) -> Option<String> {
        if let VoiceChoice::Resolved(choice) = &*self.voice.lock() {
            return choice.clone();
        }
        match tokio::time::timeout(self.config.voice_load_timeout, self.backend.list_voices()).await
        {
            Ok(Ok(voices)) => {
                let choice = pick_voice(&voices, &self.config.language, self.config.preferred_voice.as_deref());
                match &choice {
                    Some(id) => debug!(voice = %id, "voice selected"),
                    None => debug!("no matching voice, using backend default"),
                }
                *self.voice.lock() = VoiceChoice::Resolved(choice.clone());
                choice
            }
            Ok(Err(e)) => {
                warn!("voice list unavailable: {}", e);
                *self.voice.lock() = VoiceChoice::Resolved(None);
                None
            }
            Err(_) => {
                warn!(
                    timeout = ?self.config.voice_load_timeout,
                    "voice list not ready in time, proceeding without explicit voice"
                );
                None
            }
        }
    }
}

/// Voice selection: an explicit preference wins; otherwise prefer a voice
/// matching the target language with a friendly/female name, then any voice
/// matching the language, then the first voice available.
fn pick_voice(voices: &[VoiceInfo], language: &str, preferred: Option<&str>) -> Option<String> {
    if let Some(wanted) = preferred {
        if let Some(voice) = voices.iter().find(|v| v.id == wanted) {
            return Some(voice.id.clone());
        }
        warn!(voice = wanted, "preferred voice not found, falling back to heuristic");
    }

    let sounds_friendly = |voice: &VoiceInfo| {
        matches!(voice.gender, Some(VoiceGender::Female)) || {
            let name = voice.name.to_ascii_lowercase();
            FRIENDLY_NAME_HINTS.iter().any(|hint| name.contains(hint))
        }
    };

    voices
        .iter()
        .find(|v| v.serves_language(language) && sounds_friendly(v))
        .or_else(|| voices.iter().find(|v| v.serves_language(language)))
        .or_else(|| voices.first())
        .map(|v| v.id.clone())
}

/// Completion budget once speech has started, scaled by word count so long
/// facts are not cut off while a stuck utterance is still bounded.
fn completion_budget(text: &str, config: &SpeechConfig) -> Duration {
    let words = text.split_whitespace().count() as u32;
    config
        .min_completion_timeout
        .max(config.completion_timeout_per_word * words.max(1))
}

/// Drive one utterance from request to a terminal state.
///
/// Runs as its own task so a new `speak` can abort it. All state updates go
/// through `release_if_current`, so a driver that lost the slot (superseded
/// or stopped) can no longer emit events or mutate the phase.
async fn drive_utterance(
    backend: Arc<dyn SpeechBackend>,
    request: UtteranceRequest,
    config: SpeechConfig,
    slot: Arc<Mutex<ActiveSlot>>,
    events: mpsc::Sender<SpeechEvent>,
) {
    let id = request.id;
    let budget = completion_budget(&request.text, &config);
    let (backend_tx, mut backend_rx) = mpsc::channel(8);

    if let Err(e) = backend.speak(request, backend_tx).await {
        warn!(utterance_id = id, "backend rejected utterance: {}", e);
        finish(
            &slot,
            &events,
            id,
            SpeechEvent::Failed {
                utterance_id: id,
                kind: ErrorKind::Synthesis(FailureReason::Other(e.to_string())),
            },
        )
        .await;
        return;
    }

    // Phase one: wait for speech to audibly begin.
    loop {
        let first = tokio::time::timeout(config.start_timeout, backend_rx.recv()).await;
        match first {
            Err(_) | Ok(None) => {
                warn!(utterance_id = id, "speech never started, releasing slot");
                backend.cancel().await;
                finish(
                    &slot,
                    &events,
                    id,
                    SpeechEvent::Failed {
                        utterance_id: id,
                        kind: ErrorKind::StartTimeout,
                    },
                )
                .await;
                return;
            }
            Ok(Some(event)) if event.utterance_id() != id => continue,
            Ok(Some(BackendEvent::Started { .. })) => {
                let current = {
                    let mut slot = slot.lock();
                    if slot.utterance_id == id && slot.phase == UtterancePhase::Requested {
                        slot.phase = UtterancePhase::Speaking;
                        true
                    } else {
                        false
                    }
                };
                if !current {
                    return;
                }
                let _ = events.send(SpeechEvent::Started { utterance_id: id }).await;
                break;
            }
            Ok(Some(BackendEvent::Finished { .. })) => {
                // Degenerate but legal: ended before a start was reported.
                finish(
                    &slot,
                    &events,
                    id,
                    SpeechEvent::Completed { utterance_id: id },
                )
                .await;
                return;
            }
            Ok(Some(BackendEvent::Failed { reason, .. })) => {
                finish(
                    &slot,
                    &events,
                    id,
                    SpeechEvent::Failed {
                        utterance_id: id,
                        kind: ErrorKind::Synthesis(reason),
                    },
                )
                .await;
                return;
            }
        }
    }

    // Phase two: speaking; bound the wait for a terminal event.
    let deadline = tokio::time::Instant::now() + budget;
    loop {
        match tokio::time::timeout_at(deadline, backend_rx.recv()).await {
            Err(_) | Ok(None) => {
                warn!(
                    utterance_id = id,
                    budget = ?budget,
                    "no completion or error ever arrived, treating as silent failure"
                );
                backend.cancel().await;
                finish(
                    &slot,
                    &events,
                    id,
                    SpeechEvent::Failed {
                        utterance_id: id,
                        kind: ErrorKind::SilentFailure,
                    },
                )
                .await;
                return;
            }
            Ok(Some(event)) if event.utterance_id() != id => continue,
            Ok(Some(BackendEvent::Started { .. })) => continue,
            Ok(Some(BackendEvent::Finished { .. })) => {
                finish(
                    &slot,
                    &events,
                    id,
                    SpeechEvent::Completed { utterance_id: id },
                )
                .await;
                return;
            }
            Ok(Some(BackendEvent::Failed { reason, .. })) => {
                finish(
                    &slot,
                    &events,
                    id,
                    SpeechEvent::Failed {
                        utterance_id: id,
                        kind: ErrorKind::Synthesis(reason),
                    },
                )
                .await;
                return;
            }
        }
    }
}

/// Release the slot if `id` still owns it, then emit the terminal event.
/// Returns silently when the utterance has been superseded: its events must
/// not overwrite fresher state.
async fn finish(
    slot: &Mutex<ActiveSlot>,
    events: &mpsc::Sender<SpeechEvent>,
    id: UtteranceId,
    event: SpeechEvent,
) {
    let still_current = {
        let mut slot = slot.lock();
        if slot.utterance_id == id && slot.phase != UtterancePhase::Idle {
            slot.phase = UtterancePhase::Idle;
            slot.driver = None;
            true
        } else {
            false
        }
    };
    if still_current {
        let _ = events.send(event).await;
    } else {
        debug!(utterance_id = id, "dropping event from superseded utterance");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(id: &str, name: &str, language: &str, gender: Option<VoiceGender>) -> VoiceInfo {
        VoiceInfo {
            id: id.into(),
            name: name.into(),
            language: language.into(),
            gender,
        }
    }

    #[test]
    fn pick_voice_prefers_friendly_language_match() {
        let voices = vec![
            voice("de-1", "German Female", "de-DE", Some(VoiceGender::Female)),
            voice("en-1", "English Male", "en-US", Some(VoiceGender::Male)),
            voice("en-2", "Samantha", "en-US", None),
        ];
        assert_eq!(pick_voice(&voices, "en-US", None), Some("en-2".into()));
    }

    #[test]
    fn pick_voice_falls_back_to_any_language_match() {
        let voices = vec![
            voice("fr-1", "French Female", "fr-FR", Some(VoiceGender::Female)),
            voice("en-1", "English Male", "en-GB", Some(VoiceGender::Male)),
        ];
        assert_eq!(pick_voice(&voices, "en-US", None), Some("en-1".into()));
    }

    #[test]
    fn pick_voice_falls_back_to_first_voice() {
        let voices = vec![
            voice("fr-1", "French Male", "fr-FR", Some(VoiceGender::Male)),
            voice("de-1", "German Male", "de-DE", Some(VoiceGender::Male)),
        ];
        assert_eq!(pick_voice(&voices, "en-US", None), Some("fr-1".into()));
    }

    #[test]
    fn pick_voice_honors_explicit_preference() {
        let voices = vec![
            voice("en-1", "Samantha", "en-US", Some(VoiceGender::Female)),
            voice("en-2", "Brian", "en-US", Some(VoiceGender::Male)),
        ];
        assert_eq!(pick_voice(&voices, "en-US", Some("en-2")), Some("en-2".into()));
        // Unknown preference falls through to the heuristic.
        assert_eq!(pick_voice(&voices, "en-US", Some("nope")), Some("en-1".into()));
    }

    #[test]
    fn pick_voice_with_no_voices() {
        assert_eq!(pick_voice(&[], "en-US", None), None);
    }

    #[test]
    fn completion_budget_scales_with_text_length() {
        let config = SpeechConfig::default();
        let short = completion_budget("Dog", &config);
        assert_eq!(short, config.min_completion_timeout);

        let long_text = "word ".repeat(100);
        let long = completion_budget(&long_text, &config);
        assert_eq!(long, config.completion_timeout_per_word * 100);
        assert!(long > short);
    }
}
