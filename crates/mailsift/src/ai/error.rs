use thiserror::Error;

use crate::secrets::SecretError;

/// Failures of a remote AI collaborator.
///
/// Callers inside the pipeline always recover from these with a fallback.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI collaborator is not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to resolve AI credentials: {0}")]
    Credentials(#[from] SecretError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("AI response contained no content")]
    EmptyResponse,
}
