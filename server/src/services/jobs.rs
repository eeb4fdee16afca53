//! Job offers: public search, company-owned CRUD.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::pagination::{Page, Pagination};
use super::{RecordError, clean_skills, optional_text, required_text};

pub(crate) const JOB_COLUMNS: &str = "id, company_id, title, description, city, remote, contract_type, industry, \
     required_skills, min_experience_years, salary_min, salary_max, is_active, created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct JobOffer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub city: Option<String>,
    pub remote: bool,
    pub contract_type: Option<String>,
    pub industry: Option<String>,
    pub required_skills: Vec<String>,
    pub min_experience_years: Option<i32>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// `GET /api/jobs` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSearch {
    pub q: Option<String>,
    pub city: Option<String>,
    pub contract_type: Option<String>,
    pub industry: Option<String>,
    pub remote: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl JobSearch {
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination { page: self.page, limit: self.limit }
    }
}

/// Create/update body. Fields are optional so validation can name what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub remote: Option<bool>,
    pub contract_type: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub min_experience_years: Option<i32>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidJob {
    pub title: String,
    pub description: String,
    pub city: Option<String>,
    pub remote: bool,
    pub contract_type: Option<String>,
    pub industry: Option<String>,
    pub required_skills: Vec<String>,
    pub min_experience_years: Option<i32>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub is_active: Option<bool>,
}

impl JobInput {
    pub(crate) fn validate(&self) -> Result<ValidJob, RecordError> {
        let title = required_text("title", self.title.as_deref())?;
        let description = required_text("description", self.description.as_deref())?;

        if self.min_experience_years.is_some_and(|y| y < 0) {
            return Err(RecordError::Invalid("min_experience_years must not be negative".into()));
        }
        if self.salary_min.is_some_and(|s| s < 0) || self.salary_max.is_some_and(|s| s < 0) {
            return Err(RecordError::Invalid("salary must not be negative".into()));
        }
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max)
            && min > max
        {
            return Err(RecordError::Invalid("salary_min must not exceed salary_max".into()));
        }

        Ok(ValidJob {
            title,
            description,
            city: optional_text(self.city.as_deref()),
            remote: self.remote.unwrap_or(false),
            contract_type: optional_text(self.contract_type.as_deref()),
            industry: optional_text(self.industry.as_deref()),
            required_skills: clean_skills(&self.required_skills),
            min_experience_years: self.min_experience_years,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            is_active: self.is_active,
        })
    }
}

/// Escape `%`, `_` and `\` so user text matches literally inside `ILIKE`.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub(crate) fn like_pattern(raw: &str) -> String {
    format!("%{}%", escape_like(raw))
}

fn push_search_filters(qb: &mut QueryBuilder<'_, Postgres>, search: &JobSearch) {
    qb.push(" WHERE is_active");
    if let Some(q) = optional_text(search.q.as_deref()) {
        let pattern = like_pattern(&q);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(city) = optional_text(search.city.as_deref()) {
        qb.push(" AND city ILIKE ").push_bind(escape_like(&city));
    }
    if let Some(contract) = optional_text(search.contract_type.as_deref()) {
        qb.push(" AND contract_type = ").push_bind(contract);
    }
    if let Some(industry) = optional_text(search.industry.as_deref()) {
        qb.push(" AND industry ILIKE ").push_bind(escape_like(&industry));
    }
    if let Some(remote) = search.remote {
        qb.push(" AND remote = ").push_bind(remote);
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// Active offers matching the search, newest first.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn search(pool: &PgPool, search: &JobSearch) -> Result<Page<JobOffer>, RecordError> {
    let pagination = search.pagination();

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM job_offers");
    push_search_filters(&mut count, search);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut rows = QueryBuilder::<Postgres>::new(format!("SELECT {JOB_COLUMNS} FROM job_offers"));
    push_search_filters(&mut rows, search);
    rows.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(pagination.sql_limit())
        .push(" OFFSET ")
        .push_bind(pagination.offset());
    let items = rows.build_query_as::<JobOffer>().fetch_all(pool).await?;

    Ok(Page::new(items, pagination, total))
}

/// # Errors
///
/// Returns `NotFound` if no offer has this id.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<JobOffer, RecordError> {
    sqlx::query_as::<_, JobOffer>(&format!("SELECT {JOB_COLUMNS} FROM job_offers WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RecordError::NotFound("job offer"))
}

/// All offers of one company, including inactive ones.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn list_for_company(
    pool: &PgPool,
    company_id: Uuid,
    pagination: Pagination,
) -> Result<Page<JobOffer>, RecordError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_offers WHERE company_id = $1")
        .bind(company_id)
        .fetch_one(pool)
        .await?;
    let items = sqlx::query_as::<_, JobOffer>(&format!(
        "SELECT {JOB_COLUMNS} FROM job_offers WHERE company_id = $1
         ORDER BY created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(company_id)
    .bind(pagination.sql_limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;
    Ok(Page::new(items, pagination, total))
}

/// Load an offer and confirm `company_id` owns it.
///
/// # Errors
///
/// Returns `NotFound` or `Forbidden`.
pub async fn get_owned(pool: &PgPool, company_id: Uuid, id: Uuid) -> Result<JobOffer, RecordError> {
    let job = get(pool, id).await?;
    if job.company_id != company_id {
        return Err(RecordError::Forbidden("job offer belongs to another company"));
    }
    Ok(job)
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// # Errors
///
/// Returns `Invalid` on bad input, or a database error.
pub async fn create(pool: &PgPool, company_id: Uuid, input: &JobInput) -> Result<JobOffer, RecordError> {
    let job = input.validate()?;
    let created = sqlx::query_as::<_, JobOffer>(&format!(
        "INSERT INTO job_offers (company_id, title, description, city, remote, contract_type, industry,
                                 required_skills, min_experience_years, salary_min, salary_max, is_active)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING {JOB_COLUMNS}"
    ))
    .bind(company_id)
    .bind(&job.title)
    .bind(&job.description)
    .bind(&job.city)
    .bind(job.remote)
    .bind(&job.contract_type)
    .bind(&job.industry)
    .bind(&job.required_skills)
    .bind(job.min_experience_years)
    .bind(job.salary_min)
    .bind(job.salary_max)
    .bind(job.is_active.unwrap_or(true))
    .fetch_one(pool)
    .await
    .map_err(|e| RecordError::from_insert(e, "company"))?;

    tracing::info!(job_id = %created.id, %company_id, "job offer created");
    Ok(created)
}

/// Replace an owned offer's fields. `is_active` is kept when omitted.
///
/// # Errors
///
/// Returns `Invalid`, `NotFound`, `Forbidden`, or a database error.
pub async fn update(pool: &PgPool, company_id: Uuid, id: Uuid, input: &JobInput) -> Result<JobOffer, RecordError> {
    let job = input.validate()?;
    get_owned(pool, company_id, id).await?;

    sqlx::query_as::<_, JobOffer>(&format!(
        "UPDATE job_offers
         SET title = $3, description = $4, city = $5, remote = $6, contract_type = $7, industry = $8,
             required_skills = $9, min_experience_years = $10, salary_min = $11, salary_max = $12,
             is_active = COALESCE($13, is_active), updated_at = now()
         WHERE id = $1 AND company_id = $2
         RETURNING {JOB_COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(&job.title)
    .bind(&job.description)
    .bind(&job.city)
    .bind(job.remote)
    .bind(&job.contract_type)
    .bind(&job.industry)
    .bind(&job.required_skills)
    .bind(job.min_experience_years)
    .bind(job.salary_min)
    .bind(job.salary_max)
    .bind(job.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or(RecordError::NotFound("job offer"))
}

/// # Errors
///
/// Returns `NotFound`, `Forbidden`, or a database error.
pub async fn delete(pool: &PgPool, company_id: Uuid, id: Uuid) -> Result<(), RecordError> {
    get_owned(pool, company_id, id).await?;
    sqlx::query("DELETE FROM job_offers WHERE id = $1 AND company_id = $2")
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;
    tracing::info!(job_id = %id, %company_id, "job offer deleted");
    Ok(())
}

#[cfg(test)]
#[path = "jobs_test.rs"]
mod tests;
