//! Core types for speech delivery

use crate::UtteranceId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration. Delivery parameters are fixed per session: the
/// content is for early readers, so speech is slower than the platform
/// default and pitched slightly up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Enable/disable speech entirely (fallback text still works)
    pub enabled: bool,
    /// Fixed language tag for all utterances (e.g. "en-US")
    pub language: String,
    /// Speaking rate relative to the platform default (1.0 = default)
    pub rate: f32,
    /// Voice pitch (1.0 = normal)
    pub pitch: f32,
    /// Volume (0.0-1.0)
    pub volume: f32,
    /// Explicit voice id, overriding the selection heuristic
    pub preferred_voice: Option<String>,
    /// How long to wait for the backend voice list before proceeding anyway
    pub voice_load_timeout: Duration,
    /// Deadline for speech to audibly begin after a request
    pub start_timeout: Duration,
    /// Per-word completion budget once speech has started
    pub completion_timeout_per_word: Duration,
    /// Floor for the completion budget
    pub min_completion_timeout: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en-US".to_string(),
            rate: 0.9,
            pitch: 1.1,
            volume: 1.0,
            preferred_voice: None,
            voice_load_timeout: Duration::from_secs(1),
            start_timeout: Duration::from_secs(2),
            completion_timeout_per_word: Duration::from_millis(300),
            min_completion_timeout: Duration::from_secs(10),
        }
    }
}

/// Voice gender, where the backend reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceGender {
    Male,
    Female,
    Unknown,
}

/// One voice the backend can synthesize with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Backend voice identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Language code (e.g. "en-US", "en")
    pub language: String,
    pub gender: Option<VoiceGender>,
}

impl VoiceInfo {
    /// Whether this voice serves the given language tag, matching on the
    /// primary subtag ("en-US" serves "en" and "en-GB").
    pub fn serves_language(&self, language: &str) -> bool {
        let primary = |tag: &str| {
            tag.split(['-', '_'])
                .next()
                .unwrap_or(tag)
                .to_ascii_lowercase()
        };
        primary(&self.language) == primary(language)
    }
}

/// One request to vocalize a string of text. Ephemeral: built per `speak`
/// call, discarded when the utterance reaches a terminal state.
#[derive(Debug, Clone)]
pub struct UtteranceRequest {
    pub id: UtteranceId,
    pub text: String,
    /// Resolved voice id, if any was selected in time
    pub voice: Option<String>,
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}
