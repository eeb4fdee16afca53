//! Server configuration parsed from environment variables.
//!
//! Startup validates everything once; a bad value is reported with the name
//! of the offending variable and the process exits before binding a socket.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_JWT_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const DEFAULT_REVOCATION_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_REVOKED_TOKEN_PURGE_SECS: u64 = 3600;
pub const DEFAULT_LOGIN_MAX_ATTEMPTS: usize = 10;
pub const DEFAULT_LOGIN_WINDOW_SECS: u64 = 900;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

const MIN_JWT_SECRET_LEN: usize = 32;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub port: u16,
    pub cookie_secure: bool,
    pub jwt_ttl: Duration,
    pub bcrypt_cost: u32,
    pub revocation_cache_ttl: Duration,
    pub revoked_token_purge_interval: Duration,
    pub login_max_attempts: usize,
    pub login_window: Duration,
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Build typed server config from the process environment.
    ///
    /// Required:
    /// - `DATABASE_URL` (Supabase Postgres connection string)
    /// - `JWT_SECRET` (at least 32 bytes)
    ///
    /// Everything else has a default.
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Tests pass a map here so
    /// they never touch the shared process environment.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL",
                reason: "expected a postgres:// or postgresql:// URL".into(),
            });
        }

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            });
        }

        let frontend_url = get("FRONTEND_URL")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        if !frontend_url.starts_with("http://") && !frontend_url.starts_with("https://") {
            return Err(ConfigError::Invalid { var: "FRONTEND_URL", reason: "expected an http(s) URL".into() });
        }

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "COOKIE_SECURE",
                reason: format!("expected a boolean, got {raw:?}"),
            })?,
            None => frontend_url.starts_with("https://"),
        };

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let jwt_ttl_secs = parse_or("JWT_TTL_SECS", get("JWT_TTL_SECS"), DEFAULT_JWT_TTL_SECS)?;
        if jwt_ttl_secs == 0 {
            return Err(ConfigError::Invalid { var: "JWT_TTL_SECS", reason: "must be positive".into() });
        }

        let bcrypt_cost = parse_or("BCRYPT_COST", get("BCRYPT_COST"), DEFAULT_BCRYPT_COST)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                var: "BCRYPT_COST",
                reason: format!("must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"),
            });
        }

        let revocation_cache_ttl_secs = parse_or(
            "REVOCATION_CACHE_TTL_SECS",
            get("REVOCATION_CACHE_TTL_SECS"),
            DEFAULT_REVOCATION_CACHE_TTL_SECS,
        )?;
        let purge_secs =
            parse_or("REVOKED_TOKEN_PURGE_SECS", get("REVOKED_TOKEN_PURGE_SECS"), DEFAULT_REVOKED_TOKEN_PURGE_SECS)?;
        if purge_secs == 0 {
            return Err(ConfigError::Invalid { var: "REVOKED_TOKEN_PURGE_SECS", reason: "must be positive".into() });
        }

        let login_max_attempts =
            parse_or("LOGIN_MAX_ATTEMPTS", get("LOGIN_MAX_ATTEMPTS"), DEFAULT_LOGIN_MAX_ATTEMPTS)?;
        let login_window_secs = parse_or("LOGIN_WINDOW_SECS", get("LOGIN_WINDOW_SECS"), DEFAULT_LOGIN_WINDOW_SECS)?;
        if login_window_secs == 0 {
            return Err(ConfigError::Invalid { var: "LOGIN_WINDOW_SECS", reason: "must be positive".into() });
        }

        let db_max_connections =
            parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS)?;

        Ok(Self {
            database_url,
            jwt_secret,
            frontend_url,
            port,
            cookie_secure,
            jwt_ttl: Duration::from_secs(jwt_ttl_secs),
            bcrypt_cost,
            revocation_cache_ttl: Duration::from_secs(revocation_cache_ttl_secs),
            revoked_token_purge_interval: Duration::from_secs(purge_secs),
            login_max_attempts,
            login_window: Duration::from_secs(login_window_secs),
            db_max_connections,
        })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, reason: format!("cannot parse {raw:?}") }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
