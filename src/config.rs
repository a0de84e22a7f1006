//! Environment configuration.
//!
//! Read once at startup after `.env` is loaded. Only `DATABASE_URL` is
//! required; everything else has a default.

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SESSION_TTL_DAYS: i32 = 7;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is required")]
    Missing { var: &'static str },
    #[error("{var} is invalid: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub session_ttl_days: i32,
    pub cookie_secure: bool,
}

impl Config {
    /// Load from `DATABASE_URL`, `PORT`, `DB_MAX_CONNECTIONS`,
    /// `SESSION_TTL_DAYS` and `COOKIE_SECURE`.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a numeric variable
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing { var: "DATABASE_URL" })?;
        Ok(Self {
            database_url,
            port: env_parse("PORT", DEFAULT_PORT)?,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            session_ttl_days: env_parse("SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS)?,
            cookie_secure: env_bool("COOKIE_SECURE").unwrap_or(false),
        })
    }
}

fn env_parse<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
        Err(_) => Ok(default),
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
