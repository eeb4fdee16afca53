//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business rules and SQL so route handlers can stay
//! focused on extraction, auth plumbing and response shaping.

pub mod accounts;
pub mod admin;
pub mod applications;
pub mod auth;
pub mod companies;
pub mod csrf;
pub mod filters;
pub mod jobs;
pub mod matching;
pub mod messages;
pub mod pagination;
pub mod password;
pub mod revocation;
pub mod token;
pub mod users;

/// Error type shared by the CRUD services.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RecordError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_insert(err: sqlx::Error, what: &'static str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict(what),
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => Self::NotFound(what),
            _ => Self::Database(err),
        }
    }
}

/// Trimmed, non-empty text or a validation error naming the field.
pub(crate) fn required_text(field: &str, value: Option<&str>) -> Result<String, RecordError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| RecordError::Invalid(format!("{field} is required")))
}

/// Trimmed text, with blank strings collapsed to `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Trim, drop blanks and case-insensitive duplicates, keep first spelling.
pub(crate) fn clean_skills(skills: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
