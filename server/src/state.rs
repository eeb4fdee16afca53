//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the database pool, the validated config and the auth building
//! blocks: account and revocation stores, JWT keys, the CSRF guard, the
//! password hasher and the login throttle. The two stores are trait objects
//! so tests can run the full router against in-memory doubles.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::rate_limit::LoginThrottle;
use crate::services::accounts::{AccountStore, PgAccountStore};
use crate::services::csrf::CsrfGuard;
use crate::services::password::{PasswordError, PasswordHasher};
use crate::services::revocation::{self, PgRevocationStore, RevocationStore};
use crate::services::token::JwtKeys;

/// Shared application state. Clone is required by Axum; every field is
/// `Arc`-wrapped or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub accounts: Arc<dyn AccountStore>,
    pub revocations: Arc<dyn RevocationStore>,
    pub jwt: Arc<JwtKeys>,
    pub csrf: Arc<CsrfGuard>,
    pub passwords: Arc<PasswordHasher>,
    pub login_throttle: LoginThrottle,
}

impl AppState {
    /// Production wiring: Postgres-backed stores, revocation lookups cached
    /// per `REVOCATION_CACHE_TTL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured bcrypt cost is rejected.
    pub fn new(pool: PgPool, config: AppConfig) -> Result<Self, PasswordError> {
        let accounts: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(pool.clone()));
        let revocations = revocation::with_cache(
            Arc::new(PgRevocationStore::new(pool.clone())),
            config.revocation_cache_ttl,
        );
        Self::with_stores(pool, config, accounts, revocations)
    }

    /// Wire the state around caller-supplied stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured bcrypt cost is rejected.
    pub fn with_stores(
        pool: PgPool,
        config: AppConfig,
        accounts: Arc<dyn AccountStore>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Result<Self, PasswordError> {
        let passwords = PasswordHasher::new(config.bcrypt_cost)?;
        Ok(Self {
            pool,
            jwt: Arc::new(JwtKeys::new(&config.jwt_secret, config.jwt_ttl)),
            csrf: Arc::new(CsrfGuard::new(&config.jwt_secret)),
            passwords: Arc::new(passwords),
            login_throttle: LoginThrottle::new(config.login_max_attempts, config.login_window),
            accounts,
            revocations,
            config: Arc::new(config),
        })
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
