use std::sync::Arc;

use tracing::{info, warn};

use chirpy_db::{Database, StoreError};
use chirpy_types::api::{
    LoginRequest, LoginResponse, RefreshResponse, SignupRequest, UpdateUserRequest, UserResponse,
};

use crate::error::{ApiError, AuthError};
use crate::guard::{authenticate, bearer_token};
use crate::password::Credentials;
use crate::refresh;
use crate::token::SessionTokens;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub credentials: Credentials,
    pub tokens: SessionTokens,
    pub polka_key: String,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: &str, polka_key: &str) -> Self {
        Self {
            db,
            credentials: Credentials::default(),
            tokens: SessionTokens::new(jwt_secret),
            polka_key: polka_key.to_string(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

const MAX_EMAIL_LEN: usize = 254;

fn validate_email(email: &str) -> Result<&str, ApiError> {
    let email = email.trim();
    if email.is_empty() || email.len() > MAX_EMAIL_LEN || !email.contains('@') {
        return Err(ApiError::validation("a valid email is required"));
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }
    Ok(())
}

pub fn signup(state: &AppStateInner, req: SignupRequest) -> Result<UserResponse, ApiError> {
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;

    let password_hash = state.credentials.hash(&req.password)?;
    let user = state.db.create_user(email, &password_hash)?;

    info!("Registered user {}", user.id);
    Ok(UserResponse::from(&user))
}

/// Check a password and open a session: a signed session token plus a new
/// refresh token that replaces any earlier one.
pub fn login(state: &AppStateInner, req: LoginRequest) -> Result<LoginResponse, ApiError> {
    let email = req.email.trim();

    // A malformed email cannot belong to an account; treat it as a miss.
    let found = match validate_email(email) {
        Ok(email) => state.db.get_user_by_email(email)?,
        Err(_) => None,
    };

    let stored_hash = found.as_ref().map(|u| u.password_hash.as_str());
    let matched = state.credentials.verify_stored(&req.password, stored_hash);

    let Some(user) = found.filter(|_| matched) else {
        warn!("Failed login for {}", email);
        return Err(ApiError::InvalidCredentials);
    };

    let token = state.tokens.issue(user.id, req.expires_in_seconds)?;
    let refresh_token = refresh::generate();
    let user = refresh::attach(&state.db, user.id, &refresh_token)?;

    info!("User {} logged in", user.id);
    Ok(LoginResponse {
        id: user.id,
        email: user.email,
        is_chirpy_red: user.upgraded,
        token,
        refresh_token,
    })
}

pub fn refresh(state: &AppStateInner, header: Option<&str>) -> Result<RefreshResponse, ApiError> {
    let presented = bearer_token(header)?;
    let token = refresh::exchange(&state.db, &state.tokens, presented)?;
    Ok(RefreshResponse { token })
}

pub fn revoke(state: &AppStateInner, header: Option<&str>) -> Result<(), ApiError> {
    let presented = bearer_token(header)?;
    refresh::revoke(&state.db, presented)
}

/// Replace the caller's email and password.
pub fn update_user(
    state: &AppStateInner,
    header: Option<&str>,
    req: UpdateUserRequest,
) -> Result<UserResponse, ApiError> {
    let user_id = authenticate(&state.tokens, header)?;
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;

    let password_hash = state.credentials.hash(&req.password)?;
    let user = state
        .db
        .update_user(user_id, |u| {
            u.email = email.to_string();
            u.password_hash = password_hash;
        })
        .map_err(|e| match e {
            StoreError::NotFound { .. } => ApiError::Unauthorized(AuthError::UnknownToken),
            other => other.into(),
        })?;

    info!("User {} updated profile", user.id);
    Ok(UserResponse::from(&user))
}
