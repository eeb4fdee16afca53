//! Router test driver that keeps cookies and the CSRF token between calls,
//! the way a browser tab would.

use std::collections::HashMap;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use axum_extra::extract::cookie::Cookie;
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::app;
use crate::services::csrf::CSRF_HEADER;
use crate::state::AppState;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

impl TestResponse {
    /// Names of cookies the response set (cleared cookies included).
    pub fn set_cookie_names(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| Cookie::parse(v.to_owned()).ok())
            .map(|c| c.name().to_owned())
            .collect()
    }
}

pub struct Browser {
    app: Router,
    pub cookies: HashMap<String, String>,
    pub csrf: Option<String>,
}

impl Browser {
    pub fn new(state: AppState) -> Self {
        Self { app: app(state), cookies: HashMap::new(), csrf: None }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, true).await
    }

    pub async fn post(&mut self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body), true).await
    }

    /// Fetch a CSRF token first if none is cached, then send.
    pub async fn post_with_csrf(&mut self, uri: &str, body: serde_json::Value) -> TestResponse {
        if self.csrf.is_none() {
            self.get("/api/auth/csrf").await;
        }
        self.post(uri, body).await
    }

    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
        with_csrf: bool,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let cookie_header = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie_header);
        }
        if with_csrf && let Some(token) = &self.csrf {
            builder = builder.header(CSRF_HEADER, token);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        self.absorb(&headers);
        TestResponse { status, headers, body }
    }

    fn absorb(&mut self, headers: &HeaderMap) {
        for raw in headers.get_all(header::SET_COOKIE).iter().filter_map(|v| v.to_str().ok()) {
            let Ok(cookie) = Cookie::parse(raw.to_owned()) else { continue };
            let cleared = cookie.max_age().is_some_and(|age| age.is_zero()) || cookie.value().is_empty();
            if cleared {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies.insert(cookie.name().to_owned(), cookie.value().to_owned());
            }
        }
        if let Some(token) = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()) {
            self.csrf = Some(token.to_owned());
        }
    }
}
