//! A small axum server that speaks the LinkUp auth protocol, for client
//! tests. Runs on an ephemeral port.
//!
//! The CSRF layer mirrors the server's `routes/csrf.rs` and `services/csrf.rs`:
//! the double-submit cookie is `csrf_token`, the header is `x-csrf-token`,
//! every response re-issues the token in that header, and a failed check is
//! a 403 with `{"error": "Invalid CSRF token"}`. Keep these in step with the
//! server when either side changes.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{Value, json};

use crate::api::{CSRF_HEADER, INVALID_CSRF};
use crate::config::ClientConfig;

/// Cookie name the server sets for the double-submit check.
const CSRF_COOKIE: &str = "csrf_token";

pub const USER_EMAIL: &str = "ada@example.com";
pub const COMPANY_EMAIL: &str = "jobs@acme.test";
pub const PASSWORD: &str = "correct-horse-1";
pub const USER_ID: &str = "5b1e9c44-8f61-4c55-9a6e-0d0d4c3a2b11";
pub const COMPANY_ID: &str = "0e3b7f2a-1c9d-4e8b-b1f0-6a7c5d4e3f21";

#[derive(Default)]
pub struct StubState {
    sessions: Mutex<HashMap<String, Value>>,
    csrf_tokens: Mutex<HashSet<String>>,
    counter: AtomicU32,
    pub csrf_fetches: AtomicU32,
    pub csrf_rejections: AtomicU32,
    pub me_delay: Mutex<Duration>,
    pub fail_logout: Mutex<bool>,
}

impl StubState {
    fn next(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.counter.fetch_add(1, Ordering::SeqCst))
    }

    /// Forget every issued CSRF token, as after a server restart.
    pub fn rotate_csrf(&self) {
        self.csrf_tokens.lock().unwrap().clear();
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

pub struct StubServer {
    pub base_url: String,
    pub state: Arc<StubState>,
}

impl StubServer {
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone())
    }
}

pub async fn spawn() -> StubServer {
    let state = Arc::new(StubState::default());
    let app = Router::new()
        .route("/api/auth/csrf", get(csrf))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/register/user", post(register_user))
        .route("/api/jobs", get(search_jobs))
        .route("/api/jobs/{id}", get(job))
        .route("/api/jobs/{id}/match", get(job_match))
        .route("/api/applications", post(apply))
        .route("/api/applications/{id}", delete(withdraw))
        .route("/api/boom", get(boom))
        .layer(middleware::from_fn_with_state(state.clone(), csrf_layer))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    StubServer { base_url: format!("http://{addr}"), state }
}

/// A base url nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

#[derive(Clone)]
struct Token(String);

async fn csrf_layer(State(state): State<Arc<StubState>>, mut req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let cookie = jar.get(CSRF_COOKIE).map(|c| c.value().to_owned());
    let valid = cookie.filter(|t| state.csrf_tokens.lock().unwrap().contains(t));

    let mutating = matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH | Method::DELETE);
    let header = req.headers().get(CSRF_HEADER).and_then(|v| v.to_str().ok()).map(str::to_owned);
    let accepted = !mutating || (valid.is_some() && header == valid);

    let needs_cookie = valid.is_none();
    let token = valid.unwrap_or_else(|| {
        let token = state.next("csrf");
        state.csrf_tokens.lock().unwrap().insert(token.clone());
        token
    });

    let mut response = if accepted {
        req.extensions_mut().insert(Token(token.clone()));
        next.run(req).await
    } else {
        state.csrf_rejections.fetch_add(1, Ordering::SeqCst);
        error(StatusCode::FORBIDDEN, INVALID_CSRF)
    };
    response.headers_mut().insert(CSRF_HEADER, HeaderValue::from_str(&token).unwrap());
    if needs_cookie {
        let cookie = format!("{CSRF_COOKIE}={token}; Path=/");
        response.headers_mut().append(header::SET_COOKIE, HeaderValue::from_str(&cookie).unwrap());
    }
    response
}

fn session_cookie(token: &str) -> String {
    format!("auth_token={token}; Path=/; HttpOnly")
}

fn with_session(state: &StubState, account: Value, status: StatusCode, body: Value) -> Response {
    let token = state.next("session");
    state.sessions.lock().unwrap().insert(token.clone(), account);
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, HeaderValue::from_str(&session_cookie(&token)).unwrap());
    response
}

fn user_account(id: &str, email: &str, first: &str, last: &str, skills: &Value) -> Value {
    json!({
        "kind": "user",
        "id": id,
        "email": email,
        "first_name": first,
        "last_name": last,
        "phone": null,
        "city": "Lyon",
        "industry": "Tech",
        "skills": skills,
        "experience_years": 3,
        "bio": null,
        "role": "candidate",
        "created_at": "2026-01-05T09:00:00Z",
        "updated_at": "2026-01-05T09:00:00Z",
    })
}

fn company_account() -> Value {
    json!({
        "kind": "company",
        "id": COMPANY_ID,
        "email": COMPANY_EMAIL,
        "name": "Acme",
        "description": null,
        "industry": "Tech",
        "city": "Paris",
        "website": "https://acme.test",
        "created_at": "2026-01-05T09:00:00Z",
        "updated_at": "2026-01-05T09:00:00Z",
    })
}

async fn csrf(Extension(Token(token)): Extension<Token>, State(state): State<Arc<StubState>>) -> Json<Value> {
    state.csrf_fetches.fetch_add(1, Ordering::SeqCst);
    Json(json!({"csrf_token": token}))
}

async fn login(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let account = match email {
        USER_EMAIL => user_account(USER_ID, USER_EMAIL, "Ada", "Lovelace", &json!(["Rust", "SQL"])),
        COMPANY_EMAIL => company_account(),
        _ => return error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    };
    if password != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    let role = if account["kind"] == "company" { "company" } else { "candidate" };
    let identity = json!({"id": account["id"], "email": email, "role": role});
    with_session(&state, account, StatusCode::OK, identity)
}

async fn me(State(state): State<Arc<StubState>>, jar: CookieJar) -> Response {
    let delay = *state.me_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let token = jar.get("auth_token").map(|c| c.value().to_owned()).unwrap_or_default();
    match state.sessions.lock().unwrap().get(&token) {
        Some(account) => Json(account.clone()).into_response(),
        None => error(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}

async fn logout(State(state): State<Arc<StubState>>, jar: CookieJar) -> Response {
    if *state.fail_logout.lock().unwrap() {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    }
    if let Some(token) = jar.get("auth_token") {
        state.sessions.lock().unwrap().remove(token.value());
    }
    let mut response = StatusCode::NO_CONTENT.into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, HeaderValue::from_static("auth_token=; Path=/; Max-Age=0"));
    response
}

async fn register_user(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    if email == USER_EMAIL {
        return error(StatusCode::CONFLICT, "email already registered");
    }
    if !email.contains('@') {
        return error(StatusCode::BAD_REQUEST, "invalid email");
    }
    let id = uuid::Uuid::new_v4().to_string();
    let account = user_account(
        &id,
        &email,
        body["first_name"].as_str().unwrap_or_default(),
        body["last_name"].as_str().unwrap_or_default(),
        &body["skills"],
    );
    with_session(&state, account.clone(), StatusCode::CREATED, account)
}

pub const JOB_ID: &str = "9d2f7a10-3b4c-4d5e-8f60-718293a4b5c6";

fn job_json(id: &str, title: &str, city: Option<&String>, remote: bool) -> Value {
    json!({
        "id": id,
        "company_id": COMPANY_ID,
        "title": title,
        "description": "Build things",
        "city": city,
        "remote": remote,
        "contract_type": null,
        "industry": null,
        "required_skills": ["Rust"],
        "min_experience_years": null,
        "salary_min": null,
        "salary_max": null,
        "is_active": true,
        "created_at": "2026-01-05T09:00:00Z",
        "updated_at": "2026-01-05T09:00:00Z",
    })
}

fn signed_in(state: &StubState, jar: &CookieJar) -> bool {
    jar.get("auth_token").is_some_and(|c| state.sessions.lock().unwrap().contains_key(c.value()))
}

async fn search_jobs(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let title = params.get("q").cloned().unwrap_or_else(|| "Any".into());
    let limit: u32 = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(20);
    let remote = params.get("remote").is_some_and(|r| r == "true");
    Json(json!({
        "items": [job_json(JOB_ID, &title, params.get("city"), remote)],
        "page": 1,
        "limit": limit,
        "total": 1,
    }))
}

async fn job(Path(id): Path<String>) -> Response {
    if id == JOB_ID {
        Json(job_json(JOB_ID, "Backend engineer", None, false)).into_response()
    } else {
        error(StatusCode::NOT_FOUND, "job offer not found")
    }
}

async fn job_match(State(state): State<Arc<StubState>>, jar: CookieJar, Path(id): Path<String>) -> Response {
    if !signed_in(&state, &jar) {
        return error(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    let breakdown = json!({"skills": 40, "location": 20, "industry": 10, "experience": 20, "score": 90, "complete": true});
    Json(json!({"job_id": id, "score": 90, "breakdown": breakdown})).into_response()
}

async fn apply(State(state): State<Arc<StubState>>, jar: CookieJar, Json(body): Json<Value>) -> Response {
    if !signed_in(&state, &jar) {
        return error(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    let application = json!({
        "id": "3c4d5e6f-7a8b-4c9d-8e0f-1a2b3c4d5e6f",
        "user_id": USER_ID,
        "job_offer_id": body["job_offer_id"],
        "status": "pending",
        "cover_letter": body.get("cover_letter"),
        "created_at": "2026-01-06T10:00:00Z",
        "updated_at": "2026-01-06T10:00:00Z",
    });
    (StatusCode::CREATED, Json(application)).into_response()
}

async fn withdraw(State(state): State<Arc<StubState>>, jar: CookieJar) -> Response {
    if !signed_in(&state, &jar) {
        return error(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn boom() -> Response {
    error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
