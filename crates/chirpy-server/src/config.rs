use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub polka_key: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Wipe the store file at startup.
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("JWT_SECRET is unset or still a placeholder");
        }

        let polka_key = lookup("POLKA_KEY").unwrap_or_default();
        if polka_key.is_empty() {
            bail!("POLKA_KEY is unset");
        }

        let port = var_or("CHIRPY_PORT", "8080")
            .parse::<u16>()
            .context("CHIRPY_PORT must be a port number")?;

        let debug = lookup("CHIRPY_DEBUG").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(Self {
            jwt_secret,
            polka_key,
            db_path: var_or("CHIRPY_DB_PATH", "database.json").into(),
            host: var_or("CHIRPY_HOST", "0.0.0.0"),
            port,
            debug,
        })
    }
}
