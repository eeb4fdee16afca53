//! Password hashing with bcrypt.
//!
//! bcrypt is CPU bound, so both hashing and verification run on the blocking
//! pool. Lookups for unknown emails still verify against a dummy hash built
//! with the same cost, keeping response times indistinguishable.

use tokio::task;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 72;
const DUMMY_PASSWORD: &str = "linkup-dummy-password-for-timing";

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hashing task failed: {0}")]
    Join(#[from] task::JoinError),
}

pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    /// Build a hasher for the given bcrypt cost.
    ///
    /// # Errors
    ///
    /// Returns an error if the cost is outside bcrypt's accepted range.
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        let dummy_hash = bcrypt::hash(DUMMY_PASSWORD, cost)?;
        Ok(Self { cost, dummy_hash })
    }

    #[must_use]
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password.
    ///
    /// # Errors
    ///
    /// Returns an error if bcrypt fails or the blocking task panics.
    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        let cost = self.cost;
        let hash = task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    /// Verify a password against a stored hash. `None` means the account does
    /// not exist; the dummy hash is checked instead and the result is always
    /// `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored hash is malformed or the task panics.
    pub async fn verify(&self, password: &str, stored_hash: Option<&str>) -> Result<bool, PasswordError> {
        let exists = stored_hash.is_some();
        let hash = stored_hash.unwrap_or(&self.dummy_hash).to_owned();
        let password = password.to_owned();
        let matched = task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        Ok(exists && matched)
    }
}

/// Minimal strength policy: 8..=72 bytes (bcrypt truncates beyond 72), at
/// least one letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(format!("password must be at least {MIN_PASSWORD_LEN} characters"));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(format!("password must be at most {MAX_PASSWORD_LEN} bytes"));
    }
    if !password.chars().any(char::is_alphabetic) || !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("password must contain a letter and a digit".into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "password_test.rs"]
mod tests;
