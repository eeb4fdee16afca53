//! Credential login, registration and JWT session checks.
//!
//! SESSION LIFECYCLE
//! =================
//! login/register -> signed JWT (`sub`, `role`, `jti`, `exp`) in an httpOnly
//! cookie -> every request verifies the signature, expiry and that the `jti`
//! is not revoked -> logout revokes the `jti` until the token's own expiry.
//!
//! Unknown email and wrong password produce the same error, and both pay for
//! one bcrypt verification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::accounts::{Account, CompanyProfile, NewCompany, NewUser, Role, UserProfile};
use super::password::{PasswordError, validate_password_strength};
use super::token::{Claims, TokenError};
use super::{clean_skills, optional_text};
use crate::rate_limit::RateLimitError;
use crate::state::AppState;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,
    #[error(transparent)]
    TooManyAttempts(#[from] RateLimitError),
    #[error("email already registered")]
    EmailTaken,
    #[error("{0}")]
    Invalid(String),
    #[error("not authenticated")]
    Unauthenticated,
    #[error("password hashing failed: {0}")]
    Password(#[from] PasswordError),
    #[error("token signing failed: {0}")]
    Token(TokenError),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Minimal identity returned by login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// A freshly signed session token and its claims.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: Claims,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterCompanyRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
}

// =============================================================================
// VALIDATION
// =============================================================================

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || normalized.chars().any(char::is_whitespace) {
        return None;
    }
    Some(normalized)
}

fn required(field: &str, value: Option<&str>) -> Result<String, AuthError> {
    optional_text(value).ok_or_else(|| AuthError::Invalid(format!("{field} is required")))
}

fn checked_email(raw: Option<&str>) -> Result<String, AuthError> {
    let raw = required("email", raw)?;
    normalize_email(&raw).ok_or_else(|| AuthError::Invalid("invalid email".into()))
}

fn checked_password(raw: Option<&str>) -> Result<String, AuthError> {
    let password = raw.unwrap_or_default();
    validate_password_strength(password).map_err(AuthError::Invalid)?;
    Ok(password.to_owned())
}

pub(crate) fn validate_new_user(req: &RegisterUserRequest) -> Result<(NewUser, String), AuthError> {
    let email = checked_email(req.email.as_deref())?;
    let password = checked_password(req.password.as_deref())?;
    if req.experience_years.is_some_and(|y| !(0..=80).contains(&y)) {
        return Err(AuthError::Invalid("experience_years must be between 0 and 80".into()));
    }
    let new = NewUser {
        email,
        first_name: required("first_name", req.first_name.as_deref())?,
        last_name: required("last_name", req.last_name.as_deref())?,
        phone: optional_text(req.phone.as_deref()),
        city: optional_text(req.city.as_deref()),
        industry: optional_text(req.industry.as_deref()),
        skills: clean_skills(&req.skills),
        experience_years: req.experience_years,
    };
    Ok((new, password))
}

pub(crate) fn validate_new_company(req: &RegisterCompanyRequest) -> Result<(NewCompany, String), AuthError> {
    let email = checked_email(req.email.as_deref())?;
    let password = checked_password(req.password.as_deref())?;
    let new = NewCompany {
        email,
        name: required("name", req.name.as_deref())?,
        description: optional_text(req.description.as_deref()),
        industry: optional_text(req.industry.as_deref()),
        city: optional_text(req.city.as_deref()),
        website: optional_text(req.website.as_deref()),
    };
    Ok((new, password))
}

// =============================================================================
// SESSIONS
// =============================================================================

fn issue(state: &AppState, id: Uuid, role: Role) -> Result<IssuedSession, AuthError> {
    let (token, claims) = state.jwt.issue(id, role).map_err(AuthError::Token)?;
    Ok(IssuedSession { token, claims })
}

/// Check credentials and sign a session.
///
/// # Errors
///
/// [`AuthError::TooManyAttempts`] once the email exceeds the throttle window,
/// [`AuthError::InvalidCredentials`] for unknown email or wrong password.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(IssuedSession, Identity), AuthError> {
    let key = normalize_email(email);
    let throttle_key = key.clone().unwrap_or_else(|| email.trim().to_ascii_lowercase());
    state.login_throttle.check_and_record(&throttle_key)?;

    let credentials = match &key {
        Some(email) => state.accounts.find_credentials(email).await?,
        None => None,
    };
    let verified = state
        .passwords
        .verify(password, credentials.as_ref().map(|c| c.password_hash.as_str()))
        .await?;

    let Some(credentials) = credentials.filter(|_| verified) else {
        tracing::info!(email = %throttle_key, "login rejected");
        return Err(AuthError::InvalidCredentials);
    };

    state.login_throttle.reset(&throttle_key);
    let session = issue(state, credentials.id, credentials.role)?;
    tracing::info!(account_id = %credentials.id, role = credentials.role.as_str(), "login succeeded");
    Ok((session, Identity { id: credentials.id, email: credentials.email, role: credentials.role }))
}

/// Create a candidate account and sign it in.
///
/// # Errors
///
/// `Invalid` for bad input, `EmailTaken` when either table holds the email.
pub async fn register_user(
    state: &AppState,
    req: &RegisterUserRequest,
) -> Result<(IssuedSession, UserProfile), AuthError> {
    let (new, password) = validate_new_user(req)?;
    if state.accounts.email_taken(&new.email).await? {
        return Err(AuthError::EmailTaken);
    }
    let hash = state.passwords.hash(&password).await?;
    let user = state.accounts.create_user(&new, &hash).await.map_err(unique_to_taken)?;

    let session = issue(state, user.id, Role::Candidate)?;
    tracing::info!(user_id = %user.id, "candidate registered");
    Ok((session, user))
}

/// Create a company account and sign it in.
///
/// # Errors
///
/// `Invalid` for bad input, `EmailTaken` when either table holds the email.
pub async fn register_company(
    state: &AppState,
    req: &RegisterCompanyRequest,
) -> Result<(IssuedSession, CompanyProfile), AuthError> {
    let (new, password) = validate_new_company(req)?;
    if state.accounts.email_taken(&new.email).await? {
        return Err(AuthError::EmailTaken);
    }
    let hash = state.passwords.hash(&password).await?;
    let company = state.accounts.create_company(&new, &hash).await.map_err(unique_to_taken)?;

    let session = issue(state, company.id, Role::Company)?;
    tracing::info!(company_id = %company.id, "company registered");
    Ok((session, company))
}

fn unique_to_taken(err: sqlx::Error) -> AuthError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::EmailTaken,
        _ => AuthError::Db(err),
    }
}

/// Verify a session token and make sure it was not revoked.
///
/// # Errors
///
/// `Unauthenticated` for a bad, expired or revoked token; `Db` if the
/// revocation store cannot be reached.
pub async fn authenticate(state: &AppState, token: &str) -> Result<Claims, AuthError> {
    let claims = state.jwt.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "session token rejected");
        AuthError::Unauthenticated
    })?;
    if state.revocations.is_revoked(claims.jti).await? {
        tracing::debug!(jti = %claims.jti, "revoked session token presented");
        return Err(AuthError::Unauthenticated);
    }
    Ok(claims)
}

/// Full profile for the session's account. A deleted account reads as
/// unauthenticated.
///
/// # Errors
///
/// `Unauthenticated` when the account no longer exists.
pub async fn current_account(state: &AppState, claims: &Claims) -> Result<Account, AuthError> {
    state
        .accounts
        .find_account(claims.role, claims.sub)
        .await?
        .ok_or(AuthError::Unauthenticated)
}

/// Revoke the token's `jti` until it would have expired anyway. Invalid or
/// already-expired tokens need no revocation.
///
/// # Errors
///
/// Returns `Db` if the revocation store write fails.
pub async fn logout(state: &AppState, token: Option<&str>) -> Result<(), AuthError> {
    let Some(claims) = token.and_then(|t| state.jwt.verify(t).ok()) else {
        return Ok(());
    };
    state.revocations.revoke(claims.jti, claims.expires_at()).await?;
    tracing::info!(account_id = %claims.sub, jti = %claims.jti, "session revoked");
    Ok(())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
