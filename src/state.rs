//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Everything request-specific (anonymous work, the redirect target, the
//! loading flag) lives in a per-request `AuthFlow`, so the shared state is
//! only the pool and the settings handlers need.

use sqlx::PgPool;

use crate::config::Config;

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub session_ttl_days: i32,
    pub cookie_secure: bool,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self { pool, session_ttl_days: config.session_ttl_days, cookie_secure: config.cookie_secure }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
