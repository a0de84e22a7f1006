//! Auth routes — email/password sign-in and sign-up, session cookie.
//!
//! Each sign-in/sign-up request builds its own `AuthFlow`: the uploaded
//! anonymous work and the redirect target only live for that request.

use std::sync::Mutex;

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::services::account::PgCredentialVerifier;
use crate::services::anon_work::RequestAnonWork;
use crate::services::project::PgProjectStore;
use crate::services::resolver::{AnonWork, AuthFlow, AuthKind, AuthResult, Navigator};
use crate::services::session;
use crate::state::AppState;

const COOKIE_NAME: &str = "session_token";

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { user, token: token.to_owned() })
    }
}

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
    #[serde(default, alias = "anonWork")]
    pub anon_work: Option<AnonWork>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Tells the client to drop its stored anonymous work.
    pub clear_anon_work: bool,
}

pub(crate) fn auth_response(result: &AuthResult, redirect: Option<String>, clear_anon_work: bool) -> AuthResponse {
    match result {
        AuthResult::Success(_) => AuthResponse { success: true, error: None, redirect, clear_anon_work },
        AuthResult::Failure { error } => {
            AuthResponse { success: false, error: Some(error.clone()), redirect: None, clear_anon_work: false }
        }
    }
}

/// Navigation target captured for the JSON response.
#[derive(Debug, Default)]
pub struct RedirectSlot(Mutex<Option<String>>);

impl RedirectSlot {
    #[must_use]
    pub fn take(&self) -> Option<String> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl Navigator for RedirectSlot {
    fn go_to(&self, path: &str) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(path.to_owned());
        }
    }
}

pub(crate) fn session_cookie(token: String, secure: bool, ttl_days: i32) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::days(i64::from(ttl_days)))
        .build()
}

pub(crate) fn expired_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/sign-in`
pub async fn sign_in(State(state): State<AppState>, jar: CookieJar, Json(body): Json<AuthRequest>) -> Response {
    authenticate(state, jar, AuthKind::SignIn, body).await
}

/// `POST /api/auth/sign-up`
pub async fn sign_up(State(state): State<AppState>, jar: CookieJar, Json(body): Json<AuthRequest>) -> Response {
    authenticate(state, jar, AuthKind::SignUp, body).await
}

async fn authenticate(state: AppState, jar: CookieJar, kind: AuthKind, body: AuthRequest) -> Response {
    let flow = AuthFlow::new(
        PgCredentialVerifier::new(state.pool.clone(), state.session_ttl_days),
        RequestAnonWork::new(body.anon_work),
        PgProjectStore::new(state.pool.clone()),
        RedirectSlot::default(),
    );

    let outcome = match kind {
        AuthKind::SignIn => flow.sign_in(&body.email, &body.password).await,
        AuthKind::SignUp => flow.sign_up(&body.email, &body.password).await,
    };
    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, ?kind, "authentication failed");
            revoke_orphaned_session(&state, flow.verifier().take_opened_token()).await;
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": "Authentication failed" })))
                .into_response();
        }
    };

    let response = auth_response(&result, flow.navigator().take(), flow.anon_work().was_cleared());
    match result {
        AuthResult::Success(session) => {
            let jar = jar.add(session_cookie(session.token, state.cookie_secure, state.session_ttl_days));
            (jar, Json(response)).into_response()
        }
        AuthResult::Failure { .. } => Json(response).into_response(),
    }
}

/// Drop a session opened by a check whose project resolution then failed.
/// The client never receives its cookie.
async fn revoke_orphaned_session(state: &AppState, token: Option<String>) {
    let Some(token) = token else {
        return;
    };
    if let Err(e) = session::delete_session(&state.pool, &token).await {
        tracing::warn!(error = %e, "orphaned session delete failed");
    }
}

/// `GET /api/auth/me` — return current user.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/sign-out` — delete session, clear cookie.
pub async fn sign_out(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, user_id = %auth.user.id, "session delete failed");
    }

    let jar = CookieJar::new().add(expired_cookie(state.cookie_secure));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
