//! Anti-forgery tokens.
//!
//! DESIGN
//! ======
//! Double-submit cookie: the server hands out `nonce.signature` both as a
//! readable `csrf_token` cookie and as the `X-CSRF-Token` response header.
//! Mutating requests must echo the token in the header, and the header must
//! equal the cookie. The signature is HMAC-SHA256 over the nonce, keyed by
//! the server secret, so a token planted in the cookie jar by a sibling
//! subdomain does not validate.

use hmac::digest::Key;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const CSRF_HEADER: &str = "x-csrf-token";
pub const CSRF_COOKIE: &str = "csrf_token";

const NONCE_BYTES: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CsrfError {
    #[error("missing csrf header")]
    MissingHeader,
    #[error("missing csrf cookie")]
    MissingCookie,
    #[error("csrf header does not match cookie")]
    Mismatch,
    #[error("csrf token signature invalid")]
    BadSignature,
}

pub struct CsrfGuard {
    key: Key<HmacSha256>,
}

impl CsrfGuard {
    /// Derive the HMAC key from the server secret, separated from the JWT
    /// signing key by a fixed prefix.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let derived = Sha256::new().chain_update(b"linkup-csrf:").chain_update(secret.as_bytes()).finalize();
        let mut key = Key::<HmacSha256>::default();
        key[..derived.len()].copy_from_slice(&derived);
        Self { key }
    }

    fn mac(&self, nonce: &str) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new(&self.key);
        mac.update(nonce.as_bytes());
        mac
    }

    /// Mint a new token.
    #[must_use]
    pub fn issue(&self) -> String {
        let nonce = hex::encode(rand::rng().random::<[u8; NONCE_BYTES]>());
        let signature = hex::encode(self.mac(&nonce).finalize().into_bytes());
        format!("{nonce}.{signature}")
    }

    /// True if the token was minted by this guard.
    #[must_use]
    pub fn is_valid(&self, token: &str) -> bool {
        let Some((nonce, signature)) = token.split_once('.') else {
            return false;
        };
        if nonce.len() != NONCE_BYTES * 2 || !nonce.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        self.mac(nonce).verify_slice(&signature).is_ok()
    }

    /// Validate a mutating request's header against its cookie.
    ///
    /// # Errors
    ///
    /// Returns which part of the double-submit check failed.
    pub fn check(&self, header: Option<&str>, cookie: Option<&str>) -> Result<(), CsrfError> {
        let header = header.filter(|v| !v.is_empty()).ok_or(CsrfError::MissingHeader)?;
        let cookie = cookie.filter(|v| !v.is_empty()).ok_or(CsrfError::MissingCookie)?;
        if header != cookie {
            return Err(CsrfError::Mismatch);
        }
        if !self.is_valid(header) {
            return Err(CsrfError::BadSignature);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "csrf_test.rs"]
mod tests;
