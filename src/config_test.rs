use super::*;

// =============================================================================
// env_bool — uses unique env var names to avoid races with parallel tests.
// =============================================================================

#[test]
fn env_bool_true_variants() {
    for (i, val) in ["1", "true", "yes", "on", " TRUE "].iter().enumerate() {
        let key = format!("__TEST_UIGEN_EB_TRUE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(true), "expected true for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_false_variants() {
    for (i, val) in ["0", "false", "no", "Off"].iter().enumerate() {
        let key = format!("__TEST_UIGEN_EB_FALSE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(false), "expected false for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_invalid_or_unset_returns_none() {
    let key = "__TEST_UIGEN_EB_INVALID__";
    unsafe { std::env::set_var(key, "maybe") };
    assert_eq!(env_bool(key), None);
    unsafe { std::env::remove_var(key) };
    assert_eq!(env_bool("__TEST_UIGEN_EB_SURELY_UNSET__"), None);
}

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_unset_uses_default() {
    assert_eq!(env_parse("__TEST_UIGEN_EP_UNSET__", 42_u32).unwrap(), 42);
}

#[test]
fn env_parse_reads_trimmed_value() {
    let key = "__TEST_UIGEN_EP_SET__";
    unsafe { std::env::set_var(key, " 8080 ") };
    assert_eq!(env_parse::<u16>(key, 1).unwrap(), 8080);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_rejects_garbage() {
    let key = "__TEST_UIGEN_EP_BAD__";
    unsafe { std::env::set_var(key, "lots") };
    let err = env_parse::<u32>(key, 1).unwrap_err();
    assert!(err.to_string().contains("__TEST_UIGEN_EP_BAD__"));
    assert!(err.to_string().contains("lots"));
    unsafe { std::env::remove_var(key) };
}

#[test]
fn missing_error_names_variable() {
    let err = ConfigError::Missing { var: "DATABASE_URL" };
    assert_eq!(err.to_string(), "DATABASE_URL is required");
}
