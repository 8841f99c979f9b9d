pub mod auth;
pub mod chirps;
pub mod error;
pub mod guard;
pub mod password;
pub mod refresh;
pub mod token;
pub mod webhooks;

pub use auth::{AppState, AppStateInner};
pub use error::{ApiError, AuthError};
