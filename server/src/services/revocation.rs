//! Revoked-token store.
//!
//! ARCHITECTURE
//! ============
//! Logout records the token's `jti` together with the token's own expiry.
//! Every authenticated request asks [`RevocationStore::is_revoked`]. The
//! Postgres store is the source of truth; [`CachedRevocationStore`] puts a
//! short TTL cache in front of it so hot sessions do not hit the database on
//! every request.
//!
//! TRADE-OFFS
//! ==========
//! The cache is per process. A revocation issued by another instance becomes
//! visible here after at most one TTL. Revocations issued by this instance
//! are written through and visible immediately.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use uuid::Uuid;

const CACHE_PRUNE_THRESHOLD: usize = 10_000;

#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record `jti` as revoked until `expires_at`.
    async fn revoke(&self, jti: Uuid, expires_at: OffsetDateTime) -> Result<(), sqlx::Error>;

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, sqlx::Error>;

    /// Drop records whose token would have expired anyway. Returns the number
    /// of rows removed.
    async fn purge_expired(&self) -> Result<u64, sqlx::Error>;
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgRevocationStore {
    pool: PgPool,
}

impl PgRevocationStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RevocationStore for PgRevocationStore {
    async fn revoke(&self, jti: Uuid, expires_at: OffsetDateTime) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, sqlx::Error> {
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM revoked_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn purge_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// TTL CACHE
// =============================================================================

#[derive(Clone, Copy)]
struct CacheEntry {
    revoked: bool,
    cached_at: Instant,
}

pub struct CachedRevocationStore {
    inner: Arc<dyn RevocationStore>,
    ttl: Duration,
    entries: Mutex<HashMap<Uuid, CacheEntry>>,
}

impl CachedRevocationStore {
    #[must_use]
    pub fn new(inner: Arc<dyn RevocationStore>, ttl: Duration) -> Self {
        Self { inner, ttl, entries: Mutex::new(HashMap::new()) }
    }

    fn lookup_at(&self, jti: Uuid, now: Instant) -> Option<bool> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries
            .get(&jti)
            .filter(|entry| now.duration_since(entry.cached_at) < self.ttl)
            .map(|entry| entry.revoked)
    }

    fn remember_at(&self, jti: Uuid, revoked: bool, now: Instant) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if entries.len() >= CACHE_PRUNE_THRESHOLD {
            let ttl = self.ttl;
            entries.retain(|_, entry| now.duration_since(entry.cached_at) < ttl);
        }
        // Revocation is one-way: a lookup that started before `revoke` must
        // not overwrite the revoked entry with its stale answer.
        if !revoked && entries.get(&jti).is_some_and(|entry| entry.revoked) {
            return;
        }
        entries.insert(jti, CacheEntry { revoked, cached_at: now });
    }

    #[cfg(test)]
    fn cached_len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

#[async_trait::async_trait]
impl RevocationStore for CachedRevocationStore {
    async fn revoke(&self, jti: Uuid, expires_at: OffsetDateTime) -> Result<(), sqlx::Error> {
        self.inner.revoke(jti, expires_at).await?;
        self.remember_at(jti, true, Instant::now());
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, sqlx::Error> {
        if let Some(revoked) = self.lookup_at(jti, Instant::now()) {
            return Ok(revoked);
        }
        let revoked = self.inner.is_revoked(jti).await?;
        self.remember_at(jti, revoked, Instant::now());
        Ok(revoked)
    }

    async fn purge_expired(&self) -> Result<u64, sqlx::Error> {
        self.inner.purge_expired().await
    }
}

/// Wrap `inner` in a TTL cache unless `ttl` is zero.
#[must_use]
pub fn with_cache(inner: Arc<dyn RevocationStore>, ttl: Duration) -> Arc<dyn RevocationStore> {
    if ttl.is_zero() {
        inner
    } else {
        Arc::new(CachedRevocationStore::new(inner, ttl))
    }
}

// =============================================================================
// PURGE TASK
// =============================================================================

/// Spawn the background task that deletes expired revocation records.
pub fn spawn_purge_task(store: Arc<dyn RevocationStore>, every: Duration) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "revoked token purge configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "purged expired revoked tokens"),
                Err(e) => error!(error = %e, "revoked token purge failed"),
            }
        }
    })
}

#[cfg(test)]
#[path = "revocation_test.rs"]
mod tests;
