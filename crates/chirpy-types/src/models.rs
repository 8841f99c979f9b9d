use serde::{Deserialize, Serialize};

/// A short text post. Immutable once stored; only its author may delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: u64,
    pub body: String,
    pub author_id: u64,
}

/// A stored account. This is the persisted shape and carries the password
/// hash and refresh token, so it must never be serialized into a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    /// The single outstanding refresh token; empty when none is issued.
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub upgraded: bool,
}

impl User {
    pub fn has_refresh_token(&self, token: &str) -> bool {
        !token.is_empty() && self.refresh_token == token
    }
}

/// Ordering of chirp listings by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}
