use std::sync::OnceLock;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::ApiError;

/// Salted Argon2id password hashing with a fixed work factor.
pub struct Credentials {
    argon2: Argon2<'static>,
    /// Hash checked when there is no stored hash, built with the same
    /// work factor so a miss costs as much as a mismatch.
    dummy_hash: OnceLock<String>,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
            dummy_hash: OnceLock::new(),
        }
    }
}

impl Credentials {
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: OnceLock::new(),
        }
    }

    /// Produce a PHC-format hash string for `plaintext`.
    pub fn hash(&self, plaintext: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
    }

    /// A stored hash that does not parse counts as a mismatch.
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Like `verify`, but still spends a full verification when `stored_hash`
    /// is absent, so unknown accounts are not distinguishable by timing.
    pub fn verify_stored(&self, plaintext: &str, stored_hash: Option<&str>) -> bool {
        match stored_hash {
            Some(hash) => self.verify(plaintext, hash),
            None => {
                let dummy = self
                    .dummy_hash
                    .get_or_init(|| self.hash("chirpy-no-such-user").unwrap_or_default());
                self.verify(plaintext, dummy);
                false
            }
        }
    }
}
