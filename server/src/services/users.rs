//! Candidate profiles.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::accounts::{USER_COLUMNS, UserProfile};
use super::{RecordError, clean_skills, optional_text, required_text};

/// `PUT /api/users/me` body. Omitted `skills` keeps the stored list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub industry: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidProfile {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub industry: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub(crate) fn validate(&self) -> Result<ValidProfile, RecordError> {
        if self.experience_years.is_some_and(|y| !(0..=80).contains(&y)) {
            return Err(RecordError::Invalid("experience_years must be between 0 and 80".into()));
        }
        Ok(ValidProfile {
            first_name: required_text("first_name", self.first_name.as_deref())?,
            last_name: required_text("last_name", self.last_name.as_deref())?,
            phone: optional_text(self.phone.as_deref()),
            city: optional_text(self.city.as_deref()),
            industry: optional_text(self.industry.as_deref()),
            skills: self.skills.as_deref().map(clean_skills),
            experience_years: self.experience_years,
            bio: optional_text(self.bio.as_deref()),
        })
    }
}

/// # Errors
///
/// Returns `NotFound` when no user has this id.
pub async fn get_profile(pool: &PgPool, id: Uuid) -> Result<UserProfile, RecordError> {
    sqlx::query_as::<_, UserProfile>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RecordError::NotFound("user"))
}

/// Candidate profile as seen by companies; admins are not exposed.
///
/// # Errors
///
/// Returns `NotFound` when no candidate has this id.
pub async fn get_candidate(pool: &PgPool, id: Uuid) -> Result<UserProfile, RecordError> {
    sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND role = 'candidate'"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(RecordError::NotFound("candidate"))
}

/// # Errors
///
/// Returns `Invalid`, `NotFound`, or a database error.
pub async fn update_profile(pool: &PgPool, id: Uuid, update: &ProfileUpdate) -> Result<UserProfile, RecordError> {
    let profile = update.validate()?;
    let updated = sqlx::query_as::<_, UserProfile>(&format!(
        "UPDATE users
         SET first_name = $2, last_name = $3, phone = $4, city = $5, industry = $6,
             skills = COALESCE($7, skills), experience_years = $8, bio = $9, updated_at = now()
         WHERE id = $1
         RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(&profile.first_name)
    .bind(&profile.last_name)
    .bind(&profile.phone)
    .bind(&profile.city)
    .bind(&profile.industry)
    .bind(&profile.skills)
    .bind(profile.experience_years)
    .bind(&profile.bio)
    .fetch_optional(pool)
    .await?
    .ok_or(RecordError::NotFound("user"))?;

    tracing::debug!(user_id = %id, "profile updated");
    Ok(updated)
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
