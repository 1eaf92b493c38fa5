use thiserror::Error;

/// Service-level failure taxonomy. Every variant maps to a stable kind
/// string plus a human-readable message; `Internal` covers store and
/// transaction failures that are not detected preconditions.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Configuration(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CoreError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CoreError::Conflict(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        CoreError::Configuration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        CoreError::Internal(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::NotFound(_) => "not_found",
            CoreError::Conflict(_) => "conflict",
            CoreError::Configuration(_) => "configuration",
            CoreError::Internal(_) => "internal",
        }
    }
}

impl From<anyhow::Error> for CoreError {
    /// Typed failures raised under an `anyhow` boundary (helpers shared
    /// with transaction scopes) are recovered by downcast; anything else
    /// surfaces as internal.
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CoreError>() {
            Ok(core) => core,
            Err(other) => CoreError::Internal(format!("{other:#}")),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
