//! Account storage — candidates, admins and companies.
//!
//! ARCHITECTURE
//! ============
//! Two tables hold loginable accounts: `users` (candidates and admins) and
//! `companies`. The auth flow only needs a handful of operations over them,
//! so they sit behind [`AccountStore`]; route tests swap in an in-memory
//! implementation while production uses [`PgAccountStore`].

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, city, industry, skills, \
     experience_years, bio, role, created_at, updated_at";

pub(crate) const COMPANY_COLUMNS: &str =
    "id, email, name, description, industry, city, website, created_at, updated_at";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Company,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Candidate => "candidate",
            Self::Company => "company",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "candidate" => Some(Self::Candidate),
            "company" => Some(Self::Company),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Candidates and admins live in `users`; companies in `companies`.
    #[must_use]
    pub fn is_company(self) -> bool {
        matches!(self, Self::Company)
    }
}

/// What the login check needs: identity plus the stored hash.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub industry: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
    pub bio: Option<String>,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompanyProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Full profile of whoever holds the session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Account {
    User(UserProfile),
    Company(CompanyProfile),
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub industry: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub email: String,
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
}

// =============================================================================
// STORE
// =============================================================================

#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up login credentials by normalized email, users first.
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, sqlx::Error>;

    async fn find_account(&self, role: Role, id: Uuid) -> Result<Option<Account>, sqlx::Error>;

    /// True if either table already holds the email.
    async fn email_taken(&self, email: &str) -> Result<bool, sqlx::Error>;

    async fn create_user(&self, new: &NewUser, password_hash: &str) -> Result<UserProfile, sqlx::Error>;

    async fn create_company(&self, new: &NewCompany, password_hash: &str) -> Result<CompanyProfile, sqlx::Error>;
}

pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AccountStore for PgAccountStore {
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, sqlx::Error> {
        let user = sqlx::query_as::<_, (Uuid, String, String, String)>(
            "SELECT id, email, role, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        if let Some((id, email, role, password_hash)) = user {
            let role = Role::parse(&role).unwrap_or(Role::Candidate);
            return Ok(Some(Credentials { id, email, role, password_hash }));
        }

        let company = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT id, email, password_hash FROM companies WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company.map(|(id, email, password_hash)| Credentials { id, email, role: Role::Company, password_hash }))
    }

    async fn find_account(&self, role: Role, id: Uuid) -> Result<Option<Account>, sqlx::Error> {
        if role.is_company() {
            let row = sqlx::query_as::<_, CompanyProfile>(&format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row.map(Account::Company))
        } else {
            let row = sqlx::query_as::<_, UserProfile>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row.map(Account::User))
        }
    }

    async fn email_taken(&self, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)
                 OR EXISTS (SELECT 1 FROM companies WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_user(&self, new: &NewUser, password_hash: &str) -> Result<UserProfile, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, phone, city, industry, skills, experience_years)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new.email)
        .bind(password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.phone)
        .bind(&new.city)
        .bind(&new.industry)
        .bind(&new.skills)
        .bind(new.experience_years)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_company(&self, new: &NewCompany, password_hash: &str) -> Result<CompanyProfile, sqlx::Error> {
        sqlx::query_as::<_, CompanyProfile>(&format!(
            "INSERT INTO companies (email, password_hash, name, description, industry, city, website)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(&new.email)
        .bind(password_hash)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.industry)
        .bind(&new.city)
        .bind(&new.website)
        .fetch_one(&self.pool)
        .await
    }
}

#[cfg(test)]
#[path = "accounts_test.rs"]
mod tests;
