use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use chirpy_types::api::Claims;

use crate::error::{ApiError, AuthError};
use crate::guard::bearer_token;

pub const ISSUER: &str = "chirpy";

/// Longest lifetime a session token may have.
pub const MAX_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Clamp a requested lifetime into `1..=MAX_TTL_SECONDS`. Absent or
/// non-positive requests get the maximum.
pub fn effective_ttl(requested: Option<i64>) -> i64 {
    match requested {
        Some(secs) if secs > 0 => secs.min(MAX_TTL_SECONDS),
        _ => MAX_TTL_SECONDS,
    }
}

/// Issues and validates HS256-signed session tokens.
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionTokens {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: u64, ttl_seconds: Option<i64>) -> Result<String, ApiError> {
        self.issue_at(user_id, ttl_seconds, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: u64,
        ttl_seconds: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<String, ApiError> {
        let iat = now.timestamp();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat,
            exp: iat + effective_ttl(ttl_seconds),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {}", e)))
    }

    /// Validate the raw `Authorization` header value of a request.
    pub fn validate(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        self.decode(bearer_token(header)?)
    }

    /// Check signature, issuer and expiry of a bare token.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::BadSignature,
                _ => AuthError::Malformed,
            }
        })?;

        // Valid only while now < exp.
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(data.claims)
    }
}

/// The user id a session token was issued for.
pub fn subject(claims: &Claims) -> Result<u64, AuthError> {
    claims.sub.parse().map_err(|_| AuthError::Malformed)
}
