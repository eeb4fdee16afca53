//! Client-side session state.
//!
//! The session cookie is httpOnly, so the only way to know who is signed in
//! is to ask the server. [`AuthSession`] keeps the answer in memory and
//! drives the login, registration, bootstrap and logout flows.
//!
//! State transitions:
//!
//! ```text
//! Loading --check_auth--> Authenticated | Anonymous | Unreachable
//! any     --login ok----> Authenticated
//! any     --logout------> Anonymous
//! ```

use tokio::sync::RwLock;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::types::{Account, RegisterCompany, RegisterUser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Nothing checked yet.
    Loading,
    Authenticated(Account),
    Anonymous,
    /// The server could not be reached at all. Worth retrying.
    Unreachable,
}

/// Last failure, kept for display. [`ClientError`] is not `Clone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub message: String,
    pub retryable: bool,
}

impl From<&ClientError> for SessionError {
    fn from(e: &ClientError) -> Self {
        Self { message: e.to_string(), retryable: e.is_retryable() }
    }
}

#[derive(Debug)]
struct AuthState {
    status: AuthStatus,
    last_error: Option<SessionError>,
}

fn status_after(err: &ClientError) -> AuthStatus {
    match err {
        ClientError::Network(_) => AuthStatus::Unreachable,
        _ => AuthStatus::Anonymous,
    }
}

pub struct AuthSession {
    api: ApiClient,
    state: RwLock<AuthState>,
}

impl AuthSession {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api, state: RwLock::new(AuthState { status: AuthStatus::Loading, last_error: None }) }
    }

    /// # Errors
    ///
    /// See [`ApiClient::new`].
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(ApiClient::new(config)?))
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn status(&self) -> AuthStatus {
        self.state.read().await.status.clone()
    }

    pub async fn account(&self) -> Option<Account> {
        match &self.state.read().await.status {
            AuthStatus::Authenticated(account) => Some(account.clone()),
            _ => None,
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(self.state.read().await.status, AuthStatus::Authenticated(_))
    }

    pub async fn last_error(&self) -> Option<SessionError> {
        self.state.read().await.last_error.clone()
    }

    async fn set(&self, status: AuthStatus, last_error: Option<SessionError>) {
        let mut state = self.state.write().await;
        state.status = status;
        state.last_error = last_error;
    }

    async fn settle(&self, result: Result<Account, ClientError>) -> Result<Account, ClientError> {
        match &result {
            Ok(account) => self.set(AuthStatus::Authenticated(account.clone()), None).await,
            Err(e) => {
                // A failed sign-in does not end a session that is already live.
                let mut state = self.state.write().await;
                if !matches!(state.status, AuthStatus::Authenticated(_)) {
                    state.status = status_after(e);
                }
                state.last_error = Some(e.into());
            }
        }
        result
    }

    /// Ask the server who the session cookie belongs to.
    ///
    /// Gives up after `auth_check_timeout`: a slow server leaves the session
    /// anonymous with a retryable timeout recorded, instead of hanging.
    /// A `401` is the normal signed-out answer and records no error.
    pub async fn check_auth(&self) -> AuthStatus {
        let window = self.api.config().auth_check_timeout;
        let outcome = tokio::time::timeout(window, self.api.me())
            .await
            .unwrap_or(Err(ClientError::Timeout));

        match outcome {
            Ok(account) => {
                tracing::debug!(account_id = %account.id(), "session restored");
                self.set(AuthStatus::Authenticated(account), None).await;
            }
            Err(ClientError::Unauthorized(_)) => self.set(AuthStatus::Anonymous, None).await,
            Err(e) => {
                tracing::warn!(error = %e, "session check failed");
                self.set(status_after(&e), Some((&e).into())).await;
            }
        }
        self.status().await
    }

    /// Sign in, then hydrate the full profile from `/auth/me`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] with the server's generic message for bad
    /// credentials; the session is left anonymous.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, ClientError> {
        let result = match self.api.login(email, password).await {
            Ok(identity) => {
                tracing::info!(account_id = %identity.id, role = ?identity.role, "signed in");
                self.api.me().await
            }
            Err(e) => Err(e),
        };
        self.settle(result).await
    }

    /// Create a candidate account; the server signs it in directly.
    ///
    /// # Errors
    ///
    /// `409` when the email is taken, `400` for invalid fields.
    pub async fn register_user(&self, request: &RegisterUser) -> Result<Account, ClientError> {
        let result = self.api.register_user(request).await;
        self.settle(result).await
    }

    /// # Errors
    ///
    /// `409` when the email is taken, `400` for invalid fields.
    pub async fn register_company(&self, request: &RegisterCompany) -> Result<Account, ClientError> {
        let result = self.api.register_company(request).await;
        self.settle(result).await
    }

    /// Tell the server to revoke the session and forget it locally. Local
    /// state is cleared whatever the server answers; a failure is only
    /// recorded.
    pub async fn logout(&self) {
        let last_error = match self.api.logout().await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "logout request failed, clearing local session anyway");
                Some(SessionError::from(&e))
            }
        };
        self.set(AuthStatus::Anonymous, last_error).await;
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
