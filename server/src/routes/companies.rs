//! Company directory and company self-service routes.

use axum::extract::State;
use axum::response::Json;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::services::accounts::CompanyProfile;
use crate::services::companies::{self, CompanyUpdate};
use crate::services::jobs::{self, JobOffer};
use crate::services::pagination::{Page, Pagination};
use crate::state::AppState;

/// `GET /api/companies`
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Page<CompanyProfile>>, ApiError> {
    Ok(Json(companies::list(&state.pool, pagination).await?))
}

/// `GET /api/companies/{id}`
pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<CompanyProfile>, ApiError> {
    Ok(Json(companies::get(&state.pool, id).await?))
}

/// `PUT /api/companies/me`
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CompanyUpdate>,
) -> Result<Json<CompanyProfile>, ApiError> {
    let id = auth.require_company()?;
    Ok(Json(companies::update(&state.pool, id, &body).await?))
}

/// `GET /api/companies/me/jobs` — includes inactive offers.
pub async fn my_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Page<JobOffer>>, ApiError> {
    let id = auth.require_company()?;
    Ok(Json(jobs::list_for_company(&state.pool, id, pagination).await?))
}
