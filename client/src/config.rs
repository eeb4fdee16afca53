use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_AUTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number of milliseconds, got {value:?}")]
    InvalidMillis { var: &'static str, value: String },
    #[error("{var} must be an http(s) url, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },
}

/// Where the API lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin of the API server, without the `/api` prefix.
    pub base_url: String,
    /// Applies to every request.
    pub request_timeout: Duration,
    /// Window for the startup "who am I" check before giving up.
    pub auth_check_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            auth_check_timeout: DEFAULT_AUTH_CHECK_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_auth_check_timeout(mut self, timeout: Duration) -> Self {
        self.auth_check_timeout = timeout;
        self
    }

    /// Read `LINKUP_API_URL`, `LINKUP_REQUEST_TIMEOUT_MS` and
    /// `LINKUP_AUTH_CHECK_TIMEOUT_MS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the variable that failed to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup("LINKUP_API_URL") {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => Self::new(url),
            Some(url) => return Err(ConfigError::InvalidUrl { var: "LINKUP_API_URL", value: url }),
            None => Self::default(),
        };
        if let Some(timeout) = millis(&lookup, "LINKUP_REQUEST_TIMEOUT_MS")? {
            config.request_timeout = timeout;
        }
        if let Some(timeout) = millis(&lookup, "LINKUP_AUTH_CHECK_TIMEOUT_MS")? {
            config.auth_check_timeout = timeout;
        }
        Ok(config)
    }

    /// `path` is relative to `/api`, e.g. `"/auth/me"`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = lookup(var) else { return Ok(None) };
    raw.trim()
        .parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|_| ConfigError::InvalidMillis { var, value: raw })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
