//! Error types for the completion service.

use thiserror::Error;

/// Errors raised while talking to the completion service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LlmError {
    /// Request could not be sent or the body could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("completion API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the service.
        message: String,
    },

    /// The reply carried no message content.
    #[error("completion response contained no message content")]
    EmptyCompletion,

    /// The reply body was not the expected JSON envelope.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// No API key configured.
    #[error("missing API key for the completion service")]
    MissingApiKey,
}

impl LlmError {
    /// Whether the same request might succeed later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParse(err.to_string())
    }
}

/// Result type alias for completion operations.
pub type Result<T> = std::result::Result<T, LlmError>;
