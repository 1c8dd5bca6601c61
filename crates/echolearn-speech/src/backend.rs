//! Backend seam over the platform speech capability

use crate::error::{FailureReason, SpeechResult};
use crate::types::{UtteranceRequest, VoiceInfo};
use crate::UtteranceId;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Asynchronous notifications a backend reports for one utterance.
///
/// Every event carries the utterance id so the engine can discard events
/// from superseded requests. Backends are not trusted to deliver a terminal
/// event at all: some platforms fail by going silent, which the engine
/// catches with its own deadlines.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// Audio output has begun
    Started { utterance_id: UtteranceId },
    /// The utterance finished naturally
    Finished { utterance_id: UtteranceId },
    /// The platform reported an explicit error
    Failed {
        utterance_id: UtteranceId,
        reason: FailureReason,
    },
}

impl BackendEvent {
    pub fn utterance_id(&self) -> UtteranceId {
        match self {
            BackendEvent::Started { utterance_id }
            | BackendEvent::Finished { utterance_id }
            | BackendEvent::Failed { utterance_id, .. } => *utterance_id,
        }
    }
}

/// Platform speech capability: a request/cancel primitive with asynchronous
/// start/end/error notifications and a voice list that may resolve late.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Capability detection. The engine evaluates this once at startup;
    /// support is treated as fixed for the session.
    async fn probe(&self) -> bool;

    /// Available voices. On some platforms the list loads asynchronously,
    /// so this may take a while to resolve; the engine bounds the wait.
    async fn list_voices(&self) -> SpeechResult<Vec<VoiceInfo>>;

    /// Begin speaking. Must return promptly after initiating synthesis and
    /// report progress through `events`. The backend must tolerate the
    /// receiver being dropped mid-utterance.
    async fn speak(
        &self,
        request: UtteranceRequest,
        events: mpsc::Sender<BackendEvent>,
    ) -> SpeechResult<()>;

    /// Stop whatever is currently playing. Idempotent; safe when idle.
    async fn cancel(&self);
}
