use chirpy_db::StoreError;
use thiserror::Error;

/// Why a presented credential was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    Missing,

    #[error("authorization header or token malformed")]
    Malformed,

    #[error("token signature invalid")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("token does not match any user")]
    UnknownToken,

    #[error("service key rejected")]
    BadServiceKey,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("email already registered")]
    Conflict,

    #[error(transparent)]
    Store(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::Forbidden { .. } => Self::Forbidden,
            StoreError::DuplicateEmail => Self::Conflict,
            other => Self::Store(other),
        }
    }
}
