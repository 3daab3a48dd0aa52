use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown final status: {0}")]
    UnknownStatus(String),
    #[error("unknown processing stage: {0}")]
    UnknownStage(String),
    #[error("unknown match kind: {0}")]
    UnknownMatchKind(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
