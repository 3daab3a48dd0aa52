use thiserror::Error;

/// Errors raised by terminology lookups.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RxNormError {
    /// Request failed or timed out.
    #[error("network error: {0}")]
    Network(String),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl From<reqwest::Error> for RxNormError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RxNormError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RxNormError>;
