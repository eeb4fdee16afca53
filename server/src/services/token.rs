//! JWT issue and validation for the session cookie.
//!
//! Tokens are HS256-signed with `JWT_SECRET`. Every token carries a random
//! `jti` so a single token can be revoked at logout without touching the
//! account's other sessions.

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::accounts::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID (row in `users` or `companies`, depending on `role`).
    pub sub: Uuid,
    pub role: Role,
    /// Token ID, the key of the revocation store.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Expiry as a timestamp, clamped to "now" if the claim is out of range.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.exp).unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid: {0}")]
    Invalid(String),
    #[error("token encoding failed: {0}")]
    Encode(String),
}

pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtKeys {
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a fresh token for the account.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue(&self, sub: Uuid, role: Role) -> Result<(String, Claims), TokenError> {
        self.issue_at(sub, role, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub(crate) fn issue_at(&self, sub: Uuid, role: Role, now: i64) -> Result<(String, Claims), TokenError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims { sub, role, jti: Uuid::new_v4(), iat: now, exp: now.saturating_add(ttl) };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))?;
        Ok((token, claims))
    }

    /// Check signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] for an expired token and
    /// [`TokenError::Invalid`] for anything else that fails validation.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
