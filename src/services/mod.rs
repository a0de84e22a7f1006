//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `resolver` owns the post-auth decision procedure and the collaborator
//! traits it depends on. The remaining modules are the Postgres-backed and
//! request-scoped implementations of those collaborators, plus the chat
//! tool badge labels.

pub mod account;
pub mod anon_work;
pub mod project;
pub mod resolver;
pub mod session;
pub mod tool_badge;

/// Fault raised by a collaborator. Expected auth failures are not faults;
/// they travel as [`resolver::AuthResult::Failure`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}
