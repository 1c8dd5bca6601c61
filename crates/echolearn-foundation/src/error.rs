use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Speech subsystem error: {0}")]
    Speech(#[from] echolearn_speech::SpeechError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] echolearn_catalog::CatalogError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid interaction: {0}")]
    InvalidInteraction(String),

    #[error("Shutdown requested")]
    ShutdownRequested,

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),

    #[error("Transient error, will retry: {0}")]
    Transient(String),
}

impl AppError {
    /// Whether the application should keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Fatal(_) | AppError::ShutdownRequested)
    }
}
