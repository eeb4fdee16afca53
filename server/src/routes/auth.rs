//! Auth routes: CSRF bootstrap, registration, login, session check, logout.

use axum::Extension;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use time::Duration;
use uuid::Uuid;

use super::csrf::CsrfToken;
use super::error::{ApiError, ApiJson};
use crate::services::accounts::{Account, Role};
use crate::services::auth::{self as auth_svc, IssuedSession, LoginRequest, RegisterCompanyRequest, RegisterUserRequest};
use crate::services::token::Claims;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "auth_token";

fn session_cookie(state: &AppState, session: &IssuedSession) -> Cookie<'static> {
    let max_age = i64::try_from(state.jwt.ttl().as_secs()).unwrap_or(i64::MAX);
    Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(Duration::seconds(max_age))
        .build()
}

fn cleared_session_cookie(state: &AppState) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated account extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub claims: Claims,
}

impl AuthUser {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.claims.sub
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.claims.role
    }

    /// The caller's id if their role is one of `roles`.
    ///
    /// # Errors
    ///
    /// Returns 403 for any other role.
    pub fn require(&self, roles: &[Role]) -> Result<Uuid, ApiError> {
        if roles.contains(&self.claims.role) {
            Ok(self.claims.sub)
        } else {
            Err(ApiError::Forbidden(format!("{} accounts cannot do this", self.claims.role.as_str())))
        }
    }

    /// # Errors
    ///
    /// Returns 403 unless the caller is a candidate.
    pub fn require_candidate(&self) -> Result<Uuid, ApiError> {
        self.require(&[Role::Candidate])
    }

    /// # Errors
    ///
    /// Returns 403 unless the caller is a company.
    pub fn require_company(&self) -> Result<Uuid, ApiError> {
        self.require(&[Role::Company])
    }

    /// # Errors
    ///
    /// Returns 403 unless the caller is an admin.
    pub fn require_admin(&self) -> Result<Uuid, ApiError> {
        self.require(&[Role::Admin])
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::unauthenticated());
        }

        let app_state = AppState::from_ref(state);
        let claims = auth_svc::authenticate(&app_state, token).await?;
        Ok(Self { claims })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Serialize)]
struct CsrfResponse {
    csrf_token: String,
}

/// `GET /api/auth/csrf` — echo the token the middleware attached.
pub async fn csrf(Extension(CsrfToken(token)): Extension<CsrfToken>) -> impl IntoResponse {
    Json(CsrfResponse { csrf_token: token })
}

/// `POST /api/auth/login` — set the session cookie, return minimal identity.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, identity) = auth_svc::login(&state, &body.email, &body.password).await?;
    let jar = jar.add(session_cookie(&state, &session));
    Ok((jar, Json(identity)))
}

/// `POST /api/auth/register/user` — create a candidate and sign them in.
pub async fn register_user(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<RegisterUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, user) = auth_svc::register_user(&state, &body).await?;
    let jar = jar.add(session_cookie(&state, &session));
    Ok((StatusCode::CREATED, jar, Json(Account::User(user))))
}

/// `POST /api/auth/register/company` — create a company and sign it in.
pub async fn register_company(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<RegisterCompanyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, company) = auth_svc::register_company(&state, &body).await?;
    let jar = jar.add(session_cookie(&state, &session));
    Ok((StatusCode::CREATED, jar, Json(Account::Company(company))))
}

/// `GET /api/auth/me` — full profile of the session's account.
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Account>, ApiError> {
    let account = auth_svc::current_account(&state, &auth.claims).await?;
    Ok(Json(account))
}

/// `POST /api/auth/logout` — revoke the token if there is one, always clear
/// the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse, ApiError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned());
    auth_svc::logout(&state, token.as_deref()).await?;
    let jar = jar.add(cleared_session_cookie(&state));
    Ok((jar, StatusCode::NO_CONTENT))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
