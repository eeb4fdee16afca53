//! Admin dashboard aggregation and moderation.

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::RecordError;
use super::accounts::{USER_COLUMNS, UserProfile};
use super::applications::ApplicationStatus;
use super::pagination::{Page, Pagination};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub candidates: i64,
    pub admins: i64,
    pub companies: i64,
    pub jobs: i64,
    pub active_jobs: i64,
    pub jobs_last_30_days: i64,
    pub applications: i64,
    pub applications_by_status: BTreeMap<String, i64>,
    pub messages: i64,
}

#[derive(sqlx::FromRow)]
struct CountsRow {
    candidates: i64,
    admins: i64,
    companies: i64,
    jobs: i64,
    active_jobs: i64,
    jobs_last_30_days: i64,
    applications: i64,
    messages: i64,
}

/// Every known status present, unknown values kept as reported.
pub(crate) fn status_counts(rows: Vec<(String, i64)>) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<String, i64> =
        ApplicationStatus::ALL.iter().map(|s| (s.as_str().to_owned(), 0)).collect();
    for (status, n) in rows {
        *counts.entry(status).or_insert(0) += n;
    }
    counts
}

/// # Errors
///
/// Returns a database error if either query fails.
pub async fn stats(pool: &PgPool) -> Result<AdminStats, RecordError> {
    let counts = sqlx::query_as::<_, CountsRow>(
        "SELECT
             (SELECT COUNT(*) FROM users WHERE role = 'candidate')                         AS candidates,
             (SELECT COUNT(*) FROM users WHERE role = 'admin')                             AS admins,
             (SELECT COUNT(*) FROM companies)                                              AS companies,
             (SELECT COUNT(*) FROM job_offers)                                             AS jobs,
             (SELECT COUNT(*) FROM job_offers WHERE is_active)                             AS active_jobs,
             (SELECT COUNT(*) FROM job_offers WHERE created_at > now() - interval '30 days') AS jobs_last_30_days,
             (SELECT COUNT(*) FROM applications)                                           AS applications,
             (SELECT COUNT(*) FROM messages)                                               AS messages",
    )
    .fetch_one(pool)
    .await?;

    let by_status = sqlx::query_as::<_, (String, i64)>("SELECT status, COUNT(*) FROM applications GROUP BY status")
        .fetch_all(pool)
        .await?;

    Ok(AdminStats {
        candidates: counts.candidates,
        admins: counts.admins,
        companies: counts.companies,
        jobs: counts.jobs,
        active_jobs: counts.active_jobs,
        jobs_last_30_days: counts.jobs_last_30_days,
        applications: counts.applications,
        applications_by_status: status_counts(by_status),
        messages: counts.messages,
    })
}

/// All users (candidates and admins), newest first.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn list_users(pool: &PgPool, pagination: Pagination) -> Result<Page<UserProfile>, RecordError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(pool).await?;
    let items = sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(pagination.sql_limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;
    Ok(Page::new(items, pagination, total))
}

async fn delete_by_id(pool: &PgPool, table: &'static str, what: &'static str, id: Uuid) -> Result<(), RecordError> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RecordError::NotFound(what));
    }
    tracing::warn!(table, %id, "admin deleted record");
    Ok(())
}

/// Admins cannot delete their own account.
///
/// # Errors
///
/// Returns `Forbidden` for self-deletion, `NotFound` for an unknown id.
pub async fn delete_user(pool: &PgPool, admin_id: Uuid, id: Uuid) -> Result<(), RecordError> {
    if admin_id == id {
        return Err(RecordError::Forbidden("admins cannot delete their own account"));
    }
    delete_by_id(pool, "users", "user", id).await
}

/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub async fn delete_company(pool: &PgPool, id: Uuid) -> Result<(), RecordError> {
    delete_by_id(pool, "companies", "company", id).await
}

/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub async fn delete_job(pool: &PgPool, id: Uuid) -> Result<(), RecordError> {
    delete_by_id(pool, "job_offers", "job offer", id).await
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
