//! In-memory login throttling.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<String, VecDeque<Instant>>`,
//! keyed by normalized email. Each failed or attempted login records a
//! timestamp; once `max_attempts` fall inside the window further attempts are
//! refused before any password work is done. A successful login clears the
//! key.
//!
//! TRADE-OFFS
//! ==========
//! Counters are per process and reset on restart. That caps online guessing
//! per instance, which is the goal; it is not an account lockout.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("too many login attempts (max {limit} per {window_secs}s)")]
    TooManyAttempts { limit: usize, window_secs: u64 },
}

#[derive(Clone)]
pub struct LoginThrottle {
    inner: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    max_attempts: usize,
    window: Duration,
}

impl LoginThrottle {
    /// `max_attempts == 0` disables throttling.
    #[must_use]
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())), max_attempts, window }
    }

    /// Check the key's window, then record this attempt.
    pub fn check_and_record(&self, key: &str) -> Result<(), RateLimitError> {
        self.check_and_record_at(key, Instant::now())
    }

    fn check_and_record_at(&self, key: &str, now: Instant) -> Result<(), RateLimitError> {
        if self.max_attempts == 0 {
            return Ok(());
        }
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let attempts = inner.entry(key.to_owned()).or_default();
        prune_window(attempts, now, self.window);
        if attempts.len() >= self.max_attempts {
            return Err(RateLimitError::TooManyAttempts {
                limit: self.max_attempts,
                window_secs: self.window.as_secs(),
            });
        }
        attempts.push_back(now);

        // Keep the map from growing without bound under credential stuffing.
        let window = self.window;
        if inner.len() > 10_000 {
            inner.retain(|_, deque| {
                prune_window(deque, now, window);
                !deque.is_empty()
            });
        }
        Ok(())
    }

    /// Forget the key's attempts (after a successful login).
    pub fn reset(&self, key: &str) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.remove(key);
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
