use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file unreadable: {0}")]
    Unreadable(#[source] std::io::Error),

    #[error("store file corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("store file unwritable: {0}")]
    Unwritable(#[source] std::io::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("user {requester} does not own chirp {chirp_id}")]
    Forbidden { chirp_id: u64, requester: u64 },

    #[error("email already registered")]
    DuplicateEmail,

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub(crate) fn chirp_not_found(id: u64) -> Self {
        Self::NotFound { entity: "chirp", id }
    }

    pub(crate) fn user_not_found(id: u64) -> Self {
        Self::NotFound { entity: "user", id }
    }
}
