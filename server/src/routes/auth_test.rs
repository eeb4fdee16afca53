use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::SESSION_COOKIE;
use crate::routes::test_support::Browser;
use crate::services::accounts::Role;
use crate::state::test_helpers::{
    MemoryAccountStore, MemoryRevocationStore, TEST_PASSWORD, dummy_company, dummy_user, test_app_state,
    test_app_state_with, test_hash,
};
use crate::state::AppState;

fn seeded_state() -> (AppState, Arc<MemoryRevocationStore>) {
    let accounts = Arc::new(MemoryAccountStore::default());
    let revocations = Arc::new(MemoryRevocationStore::default());
    accounts.insert_user(dummy_user("ada@example.com"), test_hash(TEST_PASSWORD));
    accounts.insert_company(dummy_company("jobs@acme.test"), test_hash(TEST_PASSWORD));
    let mut admin = dummy_user("root@linkup.test");
    admin.role = Role::Admin.as_str().into();
    accounts.insert_user(admin, test_hash(TEST_PASSWORD));
    (test_app_state_with(accounts, revocations.clone()), revocations)
}

async fn logged_in(email: &str) -> (Browser, Arc<MemoryRevocationStore>) {
    let (state, revocations) = seeded_state();
    let mut browser = Browser::new(state);
    let res = browser
        .post_with_csrf("/api/auth/login", json!({"email": email, "password": TEST_PASSWORD}))
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    (browser, revocations)
}

// =============================================================================
// login / me
// =============================================================================

#[tokio::test]
async fn csrf_endpoint_returns_token_matching_header() {
    let mut browser = Browser::new(test_app_state());
    let res = browser.get("/api/auth/csrf").await;
    assert_eq!(res.status, StatusCode::OK);
    let token = res.body["csrf_token"].as_str().unwrap();
    assert_eq!(browser.csrf.as_deref(), Some(token));
    assert_eq!(browser.cookies.get("csrf_token").map(String::as_str), Some(token));
}

#[tokio::test]
async fn login_sets_cookie_and_me_reports_authenticated() {
    let (mut browser, _) = logged_in("ada@example.com").await;
    assert!(browser.cookies.contains_key(SESSION_COOKIE));

    let me = browser.get("/api/auth/me").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["kind"], "user");
    assert_eq!(me.body["email"], "ada@example.com");
    assert_eq!(me.body["role"], "candidate");
}

#[tokio::test]
async fn login_returns_minimal_identity() {
    let (state, _) = seeded_state();
    let mut browser = Browser::new(state);
    let res = browser
        .post_with_csrf("/api/auth/login", json!({"email": "jobs@acme.test", "password": TEST_PASSWORD}))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["role"], "company");
    assert_eq!(res.body["email"], "jobs@acme.test");
    assert!(res.body.get("password_hash").is_none());
    assert_eq!(res.body.as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_credentials_get_401_and_no_session_cookie() {
    let (state, _) = seeded_state();
    let mut browser = Browser::new(state);
    let res = browser
        .post_with_csrf("/api/auth/login", json!({"email": "ada@example.com", "password": "wrong-pass-9"}))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Invalid email or password");
    assert!(!res.set_cookie_names().contains(&SESSION_COOKIE.to_owned()));
    assert!(!browser.cookies.contains_key(SESSION_COOKIE));
}

#[tokio::test]
async fn me_without_cookie_is_401() {
    let mut browser = Browser::new(test_app_state());
    let res = browser.get("/api/auth/me").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Not authenticated");
}

#[tokio::test]
async fn tampered_token_is_401_not_500() {
    let mut browser = Browser::new(test_app_state());
    browser.cookies.insert(SESSION_COOKIE.into(), "eyJhbGciOiJIUzI1NiJ9.e30.bad".into());
    let res = browser.get("/api/auth/me").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// logout / revocation
// =============================================================================

#[tokio::test]
async fn logout_then_me_is_unauthenticated() {
    let (mut browser, revocations) = logged_in("ada@example.com").await;

    let res = browser.post("/api/auth/logout", json!({})).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.set_cookie_names().contains(&SESSION_COOKIE.to_owned()));
    assert!(!browser.cookies.contains_key(SESSION_COOKIE));
    assert_eq!(revocations.len(), 1);

    let me = browser.get("/api/auth/me").await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoked_token_replayed_after_logout_is_rejected() {
    let (mut browser, _) = logged_in("ada@example.com").await;
    let stolen = browser.cookies[SESSION_COOKIE].clone();

    browser.post("/api/auth/logout", json!({})).await;
    browser.cookies.insert(SESSION_COOKIE.into(), stolen);

    let me = browser.get("/api/auth/me").await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_without_session_still_clears_cookie() {
    let mut browser = Browser::new(test_app_state());
    let res = browser.post_with_csrf("/api/auth/logout", json!({})).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.set_cookie_names().contains(&SESSION_COOKIE.to_owned()));
}

// =============================================================================
// registration
// =============================================================================

#[tokio::test]
async fn register_user_signs_in_and_duplicate_conflicts() {
    let mut browser = Browser::new(test_app_state());
    let body = json!({
        "email": "grace@example.com",
        "password": TEST_PASSWORD,
        "first_name": "Grace",
        "last_name": "Hopper",
        "skills": ["COBOL", "cobol"],
    });
    let res = browser.post_with_csrf("/api/auth/register/user", body.clone()).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.body["kind"], "user");
    assert_eq!(res.body["skills"], json!(["COBOL"]));

    let me = browser.get("/api/auth/me").await;
    assert_eq!(me.body["email"], "grace@example.com");

    let again = browser.post("/api/auth/register/user", body).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_company_validates_input() {
    let mut browser = Browser::new(test_app_state());
    let res = browser
        .post_with_csrf(
            "/api/auth/register/company",
            json!({"email": "not-an-email", "password": TEST_PASSWORD, "name": "Acme"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "invalid email");

    let res = browser
        .post("/api/auth/register/company", json!({"email": "hr@acme.test", "password": TEST_PASSWORD, "name": "Acme"}))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["kind"], "company");
}

#[tokio::test]
async fn malformed_json_is_400_with_error_envelope() {
    let mut browser = Browser::new(test_app_state());
    let res = browser.post_with_csrf("/api/auth/login", json!({"email": 42})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["error"].is_string());
}

// =============================================================================
// throttling / roles
// =============================================================================

#[tokio::test]
async fn repeated_failed_logins_are_throttled() {
    let (mut state, _) = seeded_state();
    state.login_throttle = crate::rate_limit::LoginThrottle::new(2, std::time::Duration::from_secs(60));
    let mut browser = Browser::new(state);
    let body = json!({"email": "ada@example.com", "password": "wrong-pass-9"});

    assert_eq!(browser.post_with_csrf("/api/auth/login", body.clone()).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(browser.post("/api/auth/login", body.clone()).await.status, StatusCode::UNAUTHORIZED);
    let res = browser.post("/api/auth/login", body).await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn candidate_cannot_reach_admin_or_company_routes() {
    let (mut browser, _) = logged_in("ada@example.com").await;
    assert_eq!(browser.get("/api/admin/stats").await.status, StatusCode::FORBIDDEN);

    let res = browser.post("/api/jobs", json!({"title": "x", "description": "y"})).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn company_cannot_use_candidate_routes() {
    let (mut browser, _) = logged_in("jobs@acme.test").await;
    assert_eq!(browser.get("/api/filters").await.status, StatusCode::FORBIDDEN);
    assert_eq!(browser.get("/api/jobs/recommended").await.status, StatusCode::FORBIDDEN);
    let saved = "/api/filters/00000000-0000-0000-0000-000000000000/jobs";
    assert_eq!(browser.get(saved).await.status, StatusCode::FORBIDDEN);
    let res = browser.send(Method::DELETE, "/api/admin/jobs/00000000-0000-0000-0000-000000000000", None, true).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_cannot_delete_own_account() {
    let (mut browser, _) = logged_in("root@linkup.test").await;
    let me = browser.get("/api/auth/me").await;
    let id = me.body["id"].as_str().unwrap().to_owned();

    let res = browser.send(Method::DELETE, &format!("/api/admin/users/{id}"), None, true).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}
