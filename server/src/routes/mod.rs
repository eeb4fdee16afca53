//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! A single Axum router serves the JSON API under `/api` plus `/healthz`.
//! The browser frontend lives on another origin (`FRONTEND_URL`), so CORS
//! allows exactly that origin with credentials and exposes the CSRF header.
//! Every request passes the CSRF middleware before reaching a handler.

pub mod admin;
pub mod applications;
pub mod auth;
pub mod companies;
pub mod csrf;
pub mod error;
pub mod filters;
pub mod jobs;
pub mod messages;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::middleware;
use axum::routing::{delete, get, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::csrf::CSRF_HEADER;
use crate::state::AppState;

fn cors(frontend_url: &str) -> CorsLayer {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/'))
        .map_or_else(|_| AllowOrigin::list(Vec::<HeaderValue>::new()), AllowOrigin::exact);
    let csrf_header = HeaderName::from_static(CSRF_HEADER);
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, csrf_header.clone()])
        .expose_headers([csrf_header])
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/csrf", get(auth::csrf))
        .route("/auth/register/user", post(auth::register_user))
        .route("/auth/register/company", post(auth::register_company))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route("/users/me", get(users::get_me).put(users::update_me))
        .route("/users/{id}", get(users::get_candidate))
        .route("/companies", get(companies::list))
        .route("/companies/me", put(companies::update_me))
        .route("/companies/me/jobs", get(companies::my_jobs))
        .route("/companies/{id}", get(companies::get))
        .route("/jobs", get(jobs::search).post(jobs::create))
        .route("/jobs/recommended", get(jobs::recommended))
        .route("/jobs/{id}", get(jobs::get).put(jobs::update).delete(jobs::delete))
        .route("/jobs/{id}/match", get(jobs::match_score))
        .route("/jobs/{id}/applications", get(jobs::applicants))
        .route("/applications", post(applications::apply))
        .route("/applications/me", get(applications::mine))
        .route("/applications/{id}/status", put(applications::update_status))
        .route("/applications/{id}", delete(applications::withdraw))
        .route("/messages", get(messages::list).post(messages::send))
        .route("/messages/{id}/read", put(messages::mark_read))
        .route("/filters", get(filters::list).post(filters::create))
        .route("/filters/{id}", delete(filters::delete))
        .route("/filters/{id}/jobs", get(filters::jobs))
        .route("/admin/stats", get(admin::stats))
        .route("/admin/users", get(admin::users))
        .route("/admin/users/{id}", delete(admin::delete_user))
        .route("/admin/companies", get(admin::companies))
        .route("/admin/companies/{id}", delete(admin::delete_company))
        .route("/admin/jobs/{id}", delete(admin::delete_job))
}

/// The complete application router.
pub fn app(state: AppState) -> Router {
    let cors = cors(&state.config.frontend_url);
    Router::new()
        .nest("/api", api_routes())
        .route("/healthz", get(healthz))
        .layer(middleware::from_fn_with_state(state.clone(), csrf::csrf_layer))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
