//! Saved job-search filters for candidates.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::jobs::JobSearch;
use super::{RecordError, optional_text, required_text};

const FILTER_COLUMNS: &str = "id, user_id, name, keywords, city, contract_type, industry, remote, created_at";
pub const MAX_FILTERS_PER_USER: i64 = 50;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SavedFilter {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub keywords: Option<String>,
    pub city: Option<String>,
    pub contract_type: Option<String>,
    pub industry: Option<String>,
    pub remote: Option<bool>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SavedFilter {
    /// The `/api/jobs` query this filter stands for.
    #[must_use]
    pub fn to_search(&self) -> JobSearch {
        JobSearch {
            q: self.keywords.clone(),
            city: self.city.clone(),
            contract_type: self.contract_type.clone(),
            industry: self.industry.clone(),
            remote: self.remote,
            page: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFilter {
    pub name: Option<String>,
    pub keywords: Option<String>,
    pub city: Option<String>,
    pub contract_type: Option<String>,
    pub industry: Option<String>,
    pub remote: Option<bool>,
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<SavedFilter>, RecordError> {
    let rows = sqlx::query_as::<_, SavedFilter>(&format!(
        "SELECT {FILTER_COLUMNS} FROM filters WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns `Invalid` for a blank name or when the per-user cap is reached.
pub async fn create(pool: &PgPool, user_id: Uuid, new: &NewFilter) -> Result<SavedFilter, RecordError> {
    let name = required_text("name", new.name.as_deref())?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM filters WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if count >= MAX_FILTERS_PER_USER {
        return Err(RecordError::Invalid(format!("at most {MAX_FILTERS_PER_USER} saved filters")));
    }

    sqlx::query_as::<_, SavedFilter>(&format!(
        "INSERT INTO filters (user_id, name, keywords, city, contract_type, industry, remote)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {FILTER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(&name)
    .bind(optional_text(new.keywords.as_deref()))
    .bind(optional_text(new.city.as_deref()))
    .bind(optional_text(new.contract_type.as_deref()))
    .bind(optional_text(new.industry.as_deref()))
    .bind(new.remote)
    .fetch_one(pool)
    .await
    .map_err(|e| RecordError::from_insert(e, "user"))
}

/// One of the caller's filters; someone else's reads as missing.
///
/// # Errors
///
/// Returns `NotFound` when the filter is not the caller's.
pub async fn get(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<SavedFilter, RecordError> {
    sqlx::query_as::<_, SavedFilter>(&format!("SELECT {FILTER_COLUMNS} FROM filters WHERE id = $1 AND user_id = $2"))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(RecordError::NotFound("filter"))
}

/// Delete one of the caller's filters; someone else's filter reads as missing.
///
/// # Errors
///
/// Returns `NotFound` when nothing was deleted.
pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), RecordError> {
    let result = sqlx::query("DELETE FROM filters WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RecordError::NotFound("filter"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "filters_test.rs"]
mod tests;
