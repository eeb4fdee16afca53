//! Company directory and company profile edits.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::accounts::{COMPANY_COLUMNS, CompanyProfile};
use super::pagination::{Page, Pagination};
use super::{RecordError, optional_text, required_text};

/// `PUT /api/companies/me` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidCompany {
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
}

impl CompanyUpdate {
    pub(crate) fn validate(&self) -> Result<ValidCompany, RecordError> {
        let website = optional_text(self.website.as_deref());
        if let Some(url) = &website
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(RecordError::Invalid("website must start with http:// or https://".into()));
        }
        Ok(ValidCompany {
            name: required_text("name", self.name.as_deref())?,
            description: optional_text(self.description.as_deref()),
            industry: optional_text(self.industry.as_deref()),
            city: optional_text(self.city.as_deref()),
            website,
        })
    }
}

/// Companies ordered by name.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn list(pool: &PgPool, pagination: Pagination) -> Result<Page<CompanyProfile>, RecordError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies").fetch_one(pool).await?;
    let items = sqlx::query_as::<_, CompanyProfile>(&format!(
        "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name, id LIMIT $1 OFFSET $2"
    ))
    .bind(pagination.sql_limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;
    Ok(Page::new(items, pagination, total))
}

/// # Errors
///
/// Returns `NotFound` when no company has this id.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<CompanyProfile, RecordError> {
    sqlx::query_as::<_, CompanyProfile>(&format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RecordError::NotFound("company"))
}

/// # Errors
///
/// Returns `Invalid`, `NotFound`, or a database error.
pub async fn update(pool: &PgPool, id: Uuid, update: &CompanyUpdate) -> Result<CompanyProfile, RecordError> {
    let company = update.validate()?;
    sqlx::query_as::<_, CompanyProfile>(&format!(
        "UPDATE companies
         SET name = $2, description = $3, industry = $4, city = $5, website = $6, updated_at = now()
         WHERE id = $1
         RETURNING {COMPANY_COLUMNS}"
    ))
    .bind(id)
    .bind(&company.name)
    .bind(&company.description)
    .bind(&company.industry)
    .bind(&company.city)
    .bind(&company.website)
    .fetch_optional(pool)
    .await?
    .ok_or(RecordError::NotFound("company"))
}

#[cfg(test)]
#[path = "companies_test.rs"]
mod tests;
