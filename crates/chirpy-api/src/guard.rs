use tracing::warn;

use crate::error::{ApiError, AuthError};
use crate::token::{SessionTokens, subject};

const BEARER: &str = "Bearer ";
const API_KEY: &str = "ApiKey ";

/// Pull the token out of a `Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    scheme_value(header, BEARER)
}

fn scheme_value<'a>(header: Option<&'a str>, scheme: &str) -> Result<&'a str, AuthError> {
    let value = header
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::Missing)?;

    match value.strip_prefix(scheme).map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::Malformed),
    }
}

/// Resolve the acting user id from a session token header.
pub fn authenticate(tokens: &SessionTokens, header: Option<&str>) -> Result<u64, ApiError> {
    let claims = tokens.validate(header)?;
    Ok(subject(&claims)?)
}

pub fn check_owner(user_id: u64, owner_id: u64) -> Result<(), ApiError> {
    if user_id != owner_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

/// Authenticate and require the caller to be `owner_id`.
pub fn require_owner(
    tokens: &SessionTokens,
    header: Option<&str>,
    owner_id: u64,
) -> Result<u64, ApiError> {
    let user_id = authenticate(tokens, header)?;
    check_owner(user_id, owner_id)?;
    Ok(user_id)
}

/// Gate for trusted services presenting `ApiKey <key>`. An unset configured
/// key rejects everything.
pub fn require_service_key(header: Option<&str>, configured: &str) -> Result<(), ApiError> {
    let provided = scheme_value(header, API_KEY)?;
    if configured.is_empty() || !constant_time_eq(provided.as_bytes(), configured.as_bytes()) {
        warn!("Rejected service key");
        return Err(AuthError::BadServiceKey.into());
    }
    Ok(())
}

/// Byte comparison whose running time does not depend on where the inputs
/// first differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
