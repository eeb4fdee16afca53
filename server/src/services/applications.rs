//! Job applications.
//!
//! DESIGN
//! ======
//! A candidate applies once per offer; the `(user_id, job_offer_id)` unique
//! constraint enforces it and surfaces as `Conflict`. Only the company owning
//! the offer may move an application between statuses, and only the
//! candidate who applied may withdraw it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::accounts::{USER_COLUMNS, UserProfile};
use super::jobs::{self, JobOffer};
use super::matching::{self, CandidateSignals, JobSignals, MatchBreakdown};
use super::pagination::{Page, Pagination};
use super::{RecordError, optional_text};

const APPLICATION_COLUMNS: &str = "id, user_id, job_offer_id, status, cover_letter, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Interview, Self::Accepted, Self::Rejected];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Interview => "interview",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_offer_id: Uuid,
    pub status: String,
    pub cover_letter: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A candidate's own application with enough of the offer to render a list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MyApplication {
    pub id: Uuid,
    pub job_offer_id: Uuid,
    pub status: String,
    pub cover_letter: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub job_title: String,
    pub company_id: Uuid,
    pub company_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    pub job_offer_id: Uuid,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedApplicant {
    pub application: Application,
    pub candidate: UserProfile,
    pub score: u8,
    pub breakdown: MatchBreakdown,
}

/// Score each applicant against the offer, best first, earliest first on ties.
#[must_use]
pub fn rank_applicants(job: &JobOffer, applicants: Vec<(Application, UserProfile)>) -> Vec<RankedApplicant> {
    let job_signals = JobSignals::from(job);
    let mut ranked: Vec<RankedApplicant> = applicants
        .into_iter()
        .map(|(application, candidate)| {
            let breakdown = matching::breakdown(&CandidateSignals::from(&candidate), &job_signals);
            RankedApplicant { application, candidate, score: breakdown.score, breakdown }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.application.created_at.cmp(&b.application.created_at))
    });
    ranked
}

async fn get(pool: &PgPool, id: Uuid) -> Result<Application, RecordError> {
    sqlx::query_as::<_, Application>(&format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RecordError::NotFound("application"))
}

/// # Errors
///
/// Returns `NotFound` for a missing or inactive offer, `Conflict` when the
/// candidate already applied.
pub async fn apply(pool: &PgPool, user_id: Uuid, new: &NewApplication) -> Result<Application, RecordError> {
    let job = jobs::get(pool, new.job_offer_id).await?;
    if !job.is_active {
        return Err(RecordError::NotFound("job offer"));
    }

    let created = sqlx::query_as::<_, Application>(&format!(
        "INSERT INTO applications (user_id, job_offer_id, cover_letter)
         VALUES ($1, $2, $3)
         RETURNING {APPLICATION_COLUMNS}"
    ))
    .bind(user_id)
    .bind(job.id)
    .bind(optional_text(new.cover_letter.as_deref()))
    .fetch_one(pool)
    .await
    .map_err(|e| RecordError::from_insert(e, "application"))?;

    tracing::info!(application_id = %created.id, %user_id, job_id = %job.id, "application submitted");
    Ok(created)
}

/// # Errors
///
/// Returns a database error if either query fails.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
    pagination: Pagination,
) -> Result<Page<MyApplication>, RecordError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    let items = sqlx::query_as::<_, MyApplication>(
        "SELECT a.id, a.job_offer_id, a.status, a.cover_letter, a.created_at,
                j.title AS job_title, c.id AS company_id, c.name AS company_name
         FROM applications a
         JOIN job_offers j ON j.id = a.job_offer_id
         JOIN companies c ON c.id = j.company_id
         WHERE a.user_id = $1
         ORDER BY a.created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(pagination.sql_limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;
    Ok(Page::new(items, pagination, total))
}

/// Applicants for an owned offer, ranked by matching score.
///
/// # Errors
///
/// Returns `NotFound`/`Forbidden` if the offer is missing or not owned.
pub async fn ranked_for_job(pool: &PgPool, company_id: Uuid, job_id: Uuid) -> Result<Vec<RankedApplicant>, RecordError> {
    let job = jobs::get_owned(pool, company_id, job_id).await?;

    let applications = sqlx::query_as::<_, Application>(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_offer_id = $1"
    ))
    .bind(job.id)
    .fetch_all(pool)
    .await?;

    let user_ids: Vec<Uuid> = applications.iter().map(|a| a.user_id).collect();
    let users = sqlx::query_as::<_, UserProfile>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
        .bind(&user_ids)
        .fetch_all(pool)
        .await?;
    let mut by_id: HashMap<Uuid, UserProfile> = users.into_iter().map(|u| (u.id, u)).collect();

    let pairs = applications
        .into_iter()
        .filter_map(|a| by_id.remove(&a.user_id).map(|u| (a, u)))
        .collect();
    Ok(rank_applicants(&job, pairs))
}

/// # Errors
///
/// Returns `NotFound`, or `Forbidden` when the offer belongs to another company.
pub async fn update_status(
    pool: &PgPool,
    company_id: Uuid,
    id: Uuid,
    status: ApplicationStatus,
) -> Result<Application, RecordError> {
    let application = get(pool, id).await?;
    jobs::get_owned(pool, company_id, application.job_offer_id).await?;

    let updated = sqlx::query_as::<_, Application>(&format!(
        "UPDATE applications SET status = $2, updated_at = now() WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?
    .ok_or(RecordError::NotFound("application"))?;

    tracing::info!(application_id = %id, status = status.as_str(), "application status changed");
    Ok(updated)
}

/// # Errors
///
/// Returns `NotFound`, or `Forbidden` when another candidate owns it.
pub async fn withdraw(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), RecordError> {
    let application = get(pool, id).await?;
    if application.user_id != user_id {
        return Err(RecordError::Forbidden("application belongs to another candidate"));
    }
    sqlx::query("DELETE FROM applications WHERE id = $1").bind(id).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
#[path = "applications_test.rs"]
mod tests;
