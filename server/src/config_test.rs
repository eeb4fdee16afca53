use super::*;
use std::collections::HashMap;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

fn minimal() -> Vec<(&'static str, &'static str)> {
    vec![("DATABASE_URL", "postgres://u:p@localhost:5432/linkup"), ("JWT_SECRET", SECRET)]
}

#[test]
fn from_lookup_applies_defaults() {
    let cfg = AppConfig::from_lookup(lookup(&minimal())).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.frontend_url, DEFAULT_FRONTEND_URL);
    assert!(!cfg.cookie_secure);
    assert_eq!(cfg.jwt_ttl, Duration::from_secs(DEFAULT_JWT_TTL_SECS));
    assert_eq!(cfg.bcrypt_cost, DEFAULT_BCRYPT_COST);
    assert_eq!(cfg.revocation_cache_ttl, Duration::from_secs(DEFAULT_REVOCATION_CACHE_TTL_SECS));
    assert_eq!(cfg.login_max_attempts, DEFAULT_LOGIN_MAX_ATTEMPTS);
    assert_eq!(cfg.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
}

#[test]
fn missing_database_url_is_reported() {
    let err = AppConfig::from_lookup(lookup(&[("JWT_SECRET", SECRET)])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
}

#[test]
fn missing_jwt_secret_is_reported() {
    let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/db")])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
}

#[test]
fn blank_values_count_as_missing() {
    let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "   "), ("JWT_SECRET", SECRET)])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
}

#[test]
fn short_jwt_secret_is_rejected() {
    let err =
        AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/db"), ("JWT_SECRET", "short")]))
            .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "JWT_SECRET", .. }));
}

#[test]
fn non_postgres_url_is_rejected() {
    let err =
        AppConfig::from_lookup(lookup(&[("DATABASE_URL", "mysql://localhost/db"), ("JWT_SECRET", SECRET)]))
            .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "DATABASE_URL", .. }));
}

#[test]
fn https_frontend_infers_secure_cookie() {
    let mut pairs = minimal();
    pairs.push(("FRONTEND_URL", "https://linkup.example.com/"));
    let cfg = AppConfig::from_lookup(lookup(&pairs)).unwrap();
    assert!(cfg.cookie_secure);
    assert_eq!(cfg.frontend_url, "https://linkup.example.com");
}

#[test]
fn explicit_cookie_secure_overrides_inference() {
    let mut pairs = minimal();
    pairs.push(("FRONTEND_URL", "https://linkup.example.com"));
    pairs.push(("COOKIE_SECURE", "off"));
    let cfg = AppConfig::from_lookup(lookup(&pairs)).unwrap();
    assert!(!cfg.cookie_secure);
}

#[test]
fn garbage_cookie_secure_is_rejected() {
    let mut pairs = minimal();
    pairs.push(("COOKIE_SECURE", "maybe"));
    let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "COOKIE_SECURE", .. }));
}

#[test]
fn frontend_url_without_scheme_is_rejected() {
    let mut pairs = minimal();
    pairs.push(("FRONTEND_URL", "linkup.example.com"));
    let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "FRONTEND_URL", .. }));
}

#[test]
fn numeric_overrides_are_parsed() {
    let mut pairs = minimal();
    pairs.extend([
        ("PORT", "8080"),
        ("JWT_TTL_SECS", "3600"),
        ("BCRYPT_COST", "4"),
        ("REVOCATION_CACHE_TTL_SECS", "0"),
        ("LOGIN_MAX_ATTEMPTS", "3"),
        ("LOGIN_WINDOW_SECS", "60"),
    ]);
    let cfg = AppConfig::from_lookup(lookup(&pairs)).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.jwt_ttl, Duration::from_secs(3600));
    assert_eq!(cfg.bcrypt_cost, 4);
    assert_eq!(cfg.revocation_cache_ttl, Duration::ZERO);
    assert_eq!(cfg.login_max_attempts, 3);
    assert_eq!(cfg.login_window, Duration::from_secs(60));
}

#[test]
fn unparsable_port_is_rejected() {
    let mut pairs = minimal();
    pairs.push(("PORT", "eighty"));
    let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
}

#[test]
fn bcrypt_cost_out_of_range_is_rejected() {
    let mut pairs = minimal();
    pairs.push(("BCRYPT_COST", "2"));
    let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "BCRYPT_COST", .. }));
}

#[test]
fn zero_jwt_ttl_is_rejected() {
    let mut pairs = minimal();
    pairs.push(("JWT_TTL_SECS", "0"));
    let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "JWT_TTL_SECS", .. }));
}

// =============================================================================
// parse_bool
// =============================================================================

#[test]
fn parse_bool_true_variants() {
    for val in ["1", "true", "yes", "on", "TRUE", " On "] {
        assert_eq!(parse_bool(val), Some(true), "expected true for {val:?}");
    }
}

#[test]
fn parse_bool_false_variants() {
    for val in ["0", "false", "no", "off", "False"] {
        assert_eq!(parse_bool(val), Some(false), "expected false for {val:?}");
    }
}

#[test]
fn parse_bool_invalid_returns_none() {
    assert_eq!(parse_bool("maybe"), None);
    assert_eq!(parse_bool(""), None);
}
