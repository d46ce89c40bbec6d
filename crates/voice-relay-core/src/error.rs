use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceRelayError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VoiceRelayError>;

/// Failure raised by one of the remote provider adapters.
///
/// Each adapter only produces `CredentialMissing` or its own stage variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{provider} API key missing")]
    CredentialMissing { provider: &'static str },

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("synthesis failed: {0}")]
    Synthesis(String),
}

impl ProviderError {
    pub fn is_credential_missing(&self) -> bool {
        matches!(self, Self::CredentialMissing { .. })
    }
}
