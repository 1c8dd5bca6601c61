//! Error types for the speech subsystem

use thiserror::Error;

/// Errors returned by engine/backend operations.
#[derive(Error, Debug)]
pub enum SpeechError {
    /// Speech capability absent at detection time
    #[error("speech synthesis is not supported on this platform")]
    Unsupported,

    /// `speak` called with empty or whitespace-only text
    #[error("utterance text is empty")]
    EmptyText,

    /// Backend could not accept the request
    #[error("speech backend error: {0}")]
    Backend(String),

    /// IO error (process spawning, pipes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for speech operations.
pub type SpeechResult<T> = Result<T, SpeechError>;

/// Classified reason for an explicit synthesis failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Platform refused the request (permissions, policy)
    NotPermitted,
    /// Network-backed synthesizer could not be reached
    Network,
    /// Anything else
    Other(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::NotPermitted => write!(f, "not permitted"),
            FailureReason::Network => write!(f, "network failure"),
            FailureReason::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// How an utterance failed, as absorbed by the announcement layer.
///
/// `SilentFailure` and `StartTimeout` are timeout-derived: some platforms
/// report failure by never delivering any event at all, so the engine cannot
/// rely on an error callback arriving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Capability absent; detected once at engine startup
    Unsupported,
    /// Requested, but speech never audibly began within the start deadline
    StartTimeout,
    /// Explicit platform error
    Synthesis(FailureReason),
    /// Started, then neither completion nor error ever arrived
    SilentFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Unsupported => write!(f, "unsupported"),
            ErrorKind::StartTimeout => write!(f, "start timeout"),
            ErrorKind::Synthesis(reason) => write!(f, "synthesis error: {}", reason),
            ErrorKind::SilentFailure => write!(f, "silent failure"),
        }
    }
}
