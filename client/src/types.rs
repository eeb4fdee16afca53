//! Wire types as the API serialises them. Timestamps stay RFC 3339 strings;
//! the client only displays them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Company,
    Admin,
}

/// What `POST /api/auth/login` answers with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
    pub bio: Option<String>,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompanyProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Full profile from `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Account {
    User(UserProfile),
    Company(CompanyProfile),
}

impl Account {
    #[must_use]
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(u) => u.id,
            Self::Company(c) => c.id,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::User(u) => &u.email,
            Self::Company(c) => &c.email,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::User(u) => u.role,
            Self::Company(_) => Role::Company,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::User(u) => format!("{} {}", u.first_name, u.last_name),
            Self::Company(c) => c.name.clone(),
        }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterCompany {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Query for `GET /api/jobs`. Unset fields are left out of the query string.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewApplication {
    pub job_offer_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
}

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobOffer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub city: Option<String>,
    pub remote: bool,
    pub contract_type: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub min_experience_years: Option<i32>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MatchBreakdown {
    pub skills: u8,
    pub location: u8,
    pub industry: u8,
    pub experience: u8,
    pub score: u8,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatchResult {
    pub job_id: Uuid,
    pub score: u8,
    pub breakdown: MatchBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_offer_id: Uuid,
    pub status: String,
    pub cover_letter: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CsrfBody {
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
