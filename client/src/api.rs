//! HTTP client for the LinkUp API.
//!
//! The session lives in an httpOnly cookie the client never reads; the
//! reqwest cookie store carries it. Mutating requests also need the CSRF
//! token, which the server sends back on every response in the
//! `X-CSRF-Token` header. The client caches the latest one it saw and fetches
//! `GET /api/auth/csrf` before a mutating request when nothing is cached.

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::types::{
    Account, Application, CsrfBody, ErrorBody, Identity, JobOffer, JobSearch, LoginRequest, MatchResult,
    NewApplication, Page, RegisterCompany, RegisterUser,
};

pub const CSRF_HEADER: &str = "x-csrf-token";

/// Message the server uses when the CSRF check fails.
pub(crate) const INVALID_CSRF: &str = "Invalid CSRF token";

fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

async fn error_from(response: Response) -> ClientError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text).map_or_else(
        |_| status.canonical_reason().unwrap_or("request failed").to_owned(),
        |body| body.error,
    );
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        _ => ClientError::Status { status, message },
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    csrf: RwLock<Option<String>>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config, csrf: RwLock::new(None) })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The most recent CSRF token the server handed out, if any.
    pub async fn csrf_token(&self) -> Option<String> {
        self.csrf.read().await.clone()
    }

    async fn remember_csrf(&self, response: &Response) {
        if let Some(token) = response.headers().get(CSRF_HEADER).and_then(|v| v.to_str().ok()) {
            *self.csrf.write().await = Some(token.to_owned());
        }
    }

    /// Ask the server for a token explicitly and cache it.
    ///
    /// # Errors
    ///
    /// Network failures and non-2xx answers.
    pub async fn refresh_csrf(&self) -> Result<String, ClientError> {
        let response = self.http.get(self.config.endpoint("/auth/csrf")).send().await?;
        self.remember_csrf(&response).await;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        let body: CsrfBody = response.json().await?;
        *self.csrf.write().await = Some(body.csrf_token.clone());
        Ok(body.csrf_token)
    }

    /// Send one request and turn non-2xx answers into [`ClientError`].
    ///
    /// A mutating request rejected for its CSRF token is retried once with
    /// the fresh token that came back on the rejection.
    async fn execute<F>(&self, method: Method, path: &str, build: F) -> Result<Response, ClientError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mutating = is_mutating(&method);
        if mutating && self.csrf.read().await.is_none() {
            self.refresh_csrf().await?;
        }

        let mut retried = false;
        loop {
            let mut request = self.http.request(method.clone(), self.config.endpoint(path));
            if mutating && let Some(token) = self.csrf_token().await {
                request = request.header(CSRF_HEADER, token);
            }

            tracing::debug!(%method, path, "api request");
            let response = build(request).send().await?;
            self.remember_csrf(&response).await;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            let err = error_from(response).await;
            if mutating && !retried && matches!(&err, ClientError::Forbidden(m) if m == INVALID_CSRF) {
                tracing::debug!(path, "csrf token rejected, retrying with the refreshed one");
                retried = true;
                continue;
            }
            if status.is_server_error() {
                tracing::warn!(%method, path, %status, error = %err, "api server error");
            }
            return Err(err);
        }
    }

    // =========================================================================
    // GENERIC
    // =========================================================================

    /// # Errors
    ///
    /// Network failures, non-2xx answers and undecodable bodies.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.execute(Method::GET, path, |req| req).await?;
        Ok(response.json().await?)
    }

    /// # Errors
    ///
    /// Network failures, non-2xx answers and undecodable bodies.
    pub async fn get_query<Q: Serialize, T: DeserializeOwned>(&self, path: &str, query: &Q) -> Result<T, ClientError> {
        let response = self.execute(Method::GET, path, |req| req.query(query)).await?;
        Ok(response.json().await?)
    }

    /// Send a JSON body and decode the JSON answer.
    ///
    /// # Errors
    ///
    /// Network failures, non-2xx answers and undecodable bodies.
    pub async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.execute(method, path, |req| req.json(body)).await?;
        Ok(response.json().await?)
    }

    /// For endpoints that answer `204 No Content`.
    ///
    /// # Errors
    ///
    /// Network failures and non-2xx answers.
    pub async fn send_empty(&self, method: Method, path: &str) -> Result<(), ClientError> {
        self.execute(method, path, |req| req).await?;
        Ok(())
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// Post credentials. The session cookie lands in the cookie store; the
    /// answer only carries id, email and role.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] for bad credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ClientError> {
        self.send_json(Method::POST, "/auth/login", &LoginRequest { email, password }).await
    }

    /// Who the session cookie belongs to.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] when there is no live session.
    pub async fn me(&self) -> Result<Account, ClientError> {
        self.get_json("/auth/me").await
    }

    /// # Errors
    ///
    /// Network failures and non-2xx answers.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.send_empty(Method::POST, "/auth/logout").await
    }

    /// # Errors
    ///
    /// `409` when the email is taken, `400` for invalid fields.
    pub async fn register_user(&self, request: &RegisterUser) -> Result<Account, ClientError> {
        self.send_json(Method::POST, "/auth/register/user", request).await
    }

    /// # Errors
    ///
    /// `409` when the email is taken, `400` for invalid fields.
    pub async fn register_company(&self, request: &RegisterCompany) -> Result<Account, ClientError> {
        self.send_json(Method::POST, "/auth/register/company", request).await
    }

    // =========================================================================
    // JOBS / APPLICATIONS
    // =========================================================================

    /// # Errors
    ///
    /// Network failures and non-2xx answers.
    pub async fn search_jobs(&self, search: &JobSearch) -> Result<Page<JobOffer>, ClientError> {
        self.get_query("/jobs", search).await
    }

    /// # Errors
    ///
    /// `404` when the offer does not exist.
    pub async fn job(&self, id: Uuid) -> Result<JobOffer, ClientError> {
        self.get_json(&format!("/jobs/{id}")).await
    }

    /// Match score of the signed-in candidate against one offer.
    ///
    /// # Errors
    ///
    /// `403` for non-candidates, `404` for unknown offers.
    pub async fn job_match(&self, id: Uuid) -> Result<MatchResult, ClientError> {
        self.get_json(&format!("/jobs/{id}/match")).await
    }

    /// # Errors
    ///
    /// `409` when already applied, `404` for closed or unknown offers.
    pub async fn apply(&self, application: &NewApplication) -> Result<Application, ClientError> {
        self.send_json(Method::POST, "/applications", application).await
    }

    /// # Errors
    ///
    /// `404` when the application is not the caller's.
    pub async fn withdraw(&self, application_id: Uuid) -> Result<(), ClientError> {
        self.send_empty(Method::DELETE, &format!("/applications/{application_id}")).await
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
