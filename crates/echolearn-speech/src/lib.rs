//! Speech abstraction layer for EchoLearn
//!
//! This crate provides the types and traits for best-effort speech delivery:
//! the backend seam over a platform synthesizer, utterance events, error
//! classification, and the [`SpeechEngine`] that owns the single active
//! utterance slot.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod backend;
pub mod engine;
pub mod error;
pub mod types;

pub use backend::{BackendEvent, SpeechBackend};
pub use engine::{SpeechEngine, SpeechEvent, UtterancePhase};
pub use error::{ErrorKind, FailureReason, SpeechError, SpeechResult};
pub use types::{SpeechConfig, UtteranceRequest, VoiceGender, VoiceInfo};

/// Utterance identifier; monotonic per process.
pub type UtteranceId = u64;

static UTTERANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh utterance id. Never returns 0, so 0 can mean "none".
pub fn next_utterance_id() -> UtteranceId {
    UTTERANCE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}
