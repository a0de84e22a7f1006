//! Email/password accounts.
//!
//! Sign-up and sign-in report user-facing problems as
//! [`AuthResult::Failure`]; only infrastructure problems are faults.
//! Password hashing runs on the blocking pool.

use std::sync::Mutex;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::Rng;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use super::resolver::{AuthKind, AuthResult, AuthSession, CredentialVerifier, Credentials};
use super::session;

pub const MIN_PASSWORD_LEN: usize = 8;

pub const ERR_REQUIRED: &str = "Email and password are required";
pub const ERR_INVALID_EMAIL: &str = "Invalid email address";
pub const ERR_PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
pub const ERR_EMAIL_TAKEN: &str = "Email already registered";
pub const ERR_INVALID_CREDENTIALS: &str = "Invalid credentials";

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

/// Check sign-up input, returning the normalized email.
///
/// # Errors
///
/// Returns the user-facing failure message.
pub fn validate_sign_up(email: &str, password: &str) -> Result<String, &'static str> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ERR_REQUIRED);
    }
    let email = normalize_email(email).ok_or(ERR_INVALID_EMAIL)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ERR_PASSWORD_TOO_SHORT);
    }
    Ok(email)
}

/// Hash a password into a PHC string.
///
/// # Errors
///
/// Returns [`ServiceError::PasswordHash`] if argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| ServiceError::PasswordHash(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC string. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc).is_ok_and(|hash| Argon2::default().verify_password(password.as_bytes(), &hash).is_ok())
}

/// Register a new account and open a session.
///
/// # Errors
///
/// Returns a [`ServiceError`] if hashing or the database fails. Validation
/// problems and a taken email are `Ok(AuthResult::Failure)`.
pub async fn sign_up(pool: &PgPool, email: &str, password: &str, ttl_days: i32) -> Result<AuthResult, ServiceError> {
    let email = match validate_sign_up(email, password) {
        Ok(email) => email,
        Err(message) => return Ok(AuthResult::failure(message)),
    };

    let password = password.to_owned();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let row = sqlx::query(
        r"INSERT INTO users (email, password_hash)
          VALUES ($1, $2)
          ON CONFLICT (email) DO NOTHING
          RETURNING id",
    )
    .bind(&email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(AuthResult::failure(ERR_EMAIL_TAKEN));
    };
    let user_id: Uuid = row.get("id");
    info!(%user_id, "account created");

    open_session(pool, user_id, email, ttl_days).await
}

/// Check credentials and open a session.
///
/// # Errors
///
/// Returns a [`ServiceError`] if the database or password check fails to
/// run. Wrong credentials are `Ok(AuthResult::Failure)`.
pub async fn sign_in(pool: &PgPool, email: &str, password: &str, ttl_days: i32) -> Result<AuthResult, ServiceError> {
    if email.trim().is_empty() || password.is_empty() {
        return Ok(AuthResult::failure(ERR_REQUIRED));
    }
    let Some(email) = normalize_email(email) else {
        return Ok(AuthResult::failure(ERR_INVALID_CREDENTIALS));
    };

    let row = sqlx::query("SELECT id, password_hash FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(AuthResult::failure(ERR_INVALID_CREDENTIALS));
    };
    let user_id: Uuid = row.get("id");
    let stored: String = row.get("password_hash");

    let password = password.to_owned();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await?;
    if !matches {
        return Ok(AuthResult::failure(ERR_INVALID_CREDENTIALS));
    }
    info!(%user_id, "signed in");

    open_session(pool, user_id, email, ttl_days).await
}

async fn open_session(pool: &PgPool, user_id: Uuid, email: String, ttl_days: i32) -> Result<AuthResult, ServiceError> {
    let token = session::create_session(pool, user_id, ttl_days).await?;
    Ok(AuthResult::Success(AuthSession { user_id, email, token }))
}

/// [`CredentialVerifier`] backed by the `users` table.
///
/// Remembers the token of the session it opened so the caller can revoke
/// it when the rest of the sign-in fails.
#[derive(Debug)]
pub struct PgCredentialVerifier {
    pool: PgPool,
    session_ttl_days: i32,
    opened: Mutex<Option<String>>,
}

impl PgCredentialVerifier {
    #[must_use]
    pub fn new(pool: PgPool, session_ttl_days: i32) -> Self {
        Self { pool, session_ttl_days, opened: Mutex::new(None) }
    }

    fn remember(&self, result: &AuthResult) {
        if let AuthResult::Success(session) = result
            && let Ok(mut opened) = self.opened.lock()
        {
            *opened = Some(session.token.clone());
        }
    }

    /// Take the token of the session opened by the last successful check.
    #[must_use]
    pub fn take_opened_token(&self) -> Option<String> {
        self.opened.lock().ok().and_then(|mut opened| opened.take())
    }
}

#[async_trait::async_trait]
impl CredentialVerifier for PgCredentialVerifier {
    async fn verify(&self, kind: AuthKind, credentials: &Credentials) -> Result<AuthResult, ServiceError> {
        let result = match kind {
            AuthKind::SignIn => sign_in(&self.pool, &credentials.email, &credentials.password, self.session_ttl_days).await?,
            AuthKind::SignUp => sign_up(&self.pool, &credentials.email, &credentials.password, self.session_ttl_days).await?,
        };
        self.remember(&result);
        Ok(result)
    }
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
