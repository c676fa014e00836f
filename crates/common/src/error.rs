use thiserror::Error;

#[derive(Debug, Error)]
pub enum AthenaError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("blob storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// A conditional write lost against a concurrent writer, or an insert hit an existing row.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A lookup that expects at most one match found several.
    #[error("ambiguous lookup: {0}")]
    Ambiguous(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for AthenaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type AthenaResult<T> = Result<T, AthenaError>;
