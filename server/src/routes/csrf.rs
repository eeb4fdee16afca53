//! CSRF middleware.
//!
//! Runs in front of every route. Mutating methods must carry a valid
//! `X-CSRF-Token` header matching the `csrf_token` cookie. Every response,
//! rejections included, carries the current token in the `X-CSRF-Token`
//! header; the cookie is (re)set whenever the request lacked a valid one.

use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::error::ApiError;
use crate::services::csrf::{CSRF_COOKIE, CSRF_HEADER};
use crate::state::AppState;

/// The token attached to this request's response, for handlers that echo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

pub(crate) fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

fn csrf_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, token))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub async fn csrf_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let cookie_token = jar.get(CSRF_COOKIE).map(|c| c.value().to_owned());

    let check = if is_mutating(req.method()) {
        let header = req.headers().get(CSRF_HEADER).and_then(|v| v.to_str().ok());
        state.csrf.check(header, cookie_token.as_deref())
    } else {
        Ok(())
    };

    let valid_cookie = cookie_token.filter(|t| state.csrf.is_valid(t));
    let needs_cookie = valid_cookie.is_none();
    let token = valid_cookie.unwrap_or_else(|| state.csrf.issue());

    let mut response = match check {
        Ok(()) => {
            req.extensions_mut().insert(CsrfToken(token.clone()));
            next.run(req).await
        }
        Err(err) => {
            tracing::warn!(method = %req.method(), path = %req.uri().path(), error = %err, "csrf rejected");
            ApiError::from(err).into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&token) {
        response.headers_mut().insert(CSRF_HEADER, value);
    }
    if needs_cookie {
        let cookie = csrf_cookie(token, state.config.cookie_secure);
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
#[path = "csrf_test.rs"]
mod tests;
