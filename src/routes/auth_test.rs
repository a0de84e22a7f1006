use super::*;
use crate::services::resolver::AuthSession;
use uuid::Uuid;

fn success() -> AuthResult {
    AuthResult::Success(AuthSession { user_id: Uuid::new_v4(), email: "a@b.co".into(), token: "tok".into() })
}

// =============================================================================
// auth_response
// =============================================================================

#[test]
fn success_response_carries_redirect() {
    let response = auth_response(&success(), Some("/abc".into()), true);
    assert_eq!(
        response,
        AuthResponse { success: true, error: None, redirect: Some("/abc".into()), clear_anon_work: true }
    );
}

#[test]
fn failure_response_carries_error_only() {
    let response = auth_response(&AuthResult::failure("Invalid credentials"), Some("/ignored".into()), true);
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Invalid credentials"));
    assert!(response.redirect.is_none());
    assert!(!response.clear_anon_work);
}

#[test]
fn failure_response_json_omits_redirect() {
    let json = serde_json::to_value(auth_response(&AuthResult::failure("nope"), None, false)).unwrap();
    assert_eq!(json, serde_json::json!({"success": false, "error": "nope", "clear_anon_work": false}));
}

// =============================================================================
// RedirectSlot
// =============================================================================

#[test]
fn redirect_slot_keeps_last_path() {
    let slot = RedirectSlot::default();
    assert!(slot.take().is_none());
    slot.go_to("/first");
    slot.go_to("/second");
    assert_eq!(slot.take().as_deref(), Some("/second"));
    assert!(slot.take().is_none());
}

// =============================================================================
// AuthRequest
// =============================================================================

#[test]
fn auth_request_without_anon_work() {
    let req: AuthRequest = serde_json::from_str(r#"{"email":"a@b.co","password":"pw"}"#).unwrap();
    assert_eq!(req.email, "a@b.co");
    assert!(req.anon_work.is_none());
}

#[test]
fn auth_request_accepts_camel_case_anon_work() {
    let raw = r#"{"email":"a@b.co","password":"pw","anonWork":{"messages":[{"role":"user","content":"Hello"}],"fileSystemData":{"/":{"type":"directory"}}}}"#;
    let req: AuthRequest = serde_json::from_str(raw).unwrap();
    let work = req.anon_work.unwrap();
    assert!(work.is_present());
    assert_eq!(work.messages[0].content, "Hello");
}

// =============================================================================
// Cookies
// =============================================================================

#[test]
fn session_cookie_attributes() {
    let cookie = session_cookie("tok".into(), true, 7);
    assert_eq!(cookie.name(), COOKIE_NAME);
    assert_eq!(cookie.value(), "tok");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(Duration::days(7)));
}

#[test]
fn expired_cookie_clears_value() {
    let cookie = expired_cookie(false);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    assert_eq!(cookie.secure(), Some(false));
}
