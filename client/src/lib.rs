//! Typed client for the LinkUp API plus the in-memory session state a
//! frontend or CLI drives.
//!
//! [`ApiClient`] owns the HTTP connection, the cookie jar holding the
//! httpOnly session cookie, and the cached CSRF token. [`AuthSession`] sits
//! on top and tracks who is signed in.

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod stub_server;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{AuthSession, AuthStatus, SessionError};
