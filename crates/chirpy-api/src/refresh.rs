use rand::RngCore;
use tracing::{debug, info};

use chirpy_db::Database;
use chirpy_types::models::User;

use crate::error::{ApiError, AuthError};
use crate::token::SessionTokens;

const REFRESH_TOKEN_BYTES: usize = 32;

/// A fresh opaque refresh token: 32 random bytes, hex encoded.
pub fn generate() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Make `token` the user's only outstanding refresh token.
pub fn attach(db: &Database, user_id: u64, token: &str) -> Result<User, ApiError> {
    let user = db.update_user(user_id, |u| u.refresh_token = token.to_string())?;
    debug!("Attached refresh token to user {}", user_id);
    Ok(user)
}

/// Trade a refresh token for a new session token. The refresh token itself
/// is not rotated.
pub fn exchange(db: &Database, tokens: &SessionTokens, token: &str) -> Result<String, ApiError> {
    let user = db
        .get_user_by_refresh_token(token)?
        .ok_or(AuthError::UnknownToken)?;

    tokens.issue(user.id, None)
}

/// Clear the stored token wherever it is held. Unknown tokens are a no-op.
pub fn revoke(db: &Database, token: &str) -> Result<(), ApiError> {
    match db.clear_refresh_token(token)? {
        Some(user_id) => info!("Revoked refresh token for user {}", user_id),
        None => debug!("Revoke for unknown refresh token ignored"),
    }
    Ok(())
}
