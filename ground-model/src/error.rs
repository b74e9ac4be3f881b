use thiserror::Error;

/// Errors raised while encoding or decoding model records
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record has no class discriminator")]
    MissingClass,

    #[error("Unrecognized record class: {0}")]
    UnknownClass(String),

    #[error("Unknown item kind: {0}")]
    UnknownKind(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
