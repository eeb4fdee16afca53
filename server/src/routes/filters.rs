//! Saved search filter routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::services::filters::{self, NewFilter, SavedFilter};
use crate::services::jobs::{self, JobOffer, JobSearch};
use crate::services::pagination::{Page, Pagination};
use crate::state::AppState;

/// `GET /api/filters`
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<SavedFilter>>, ApiError> {
    let user_id = auth.require_candidate()?;
    Ok(Json(filters::list(&state.pool, user_id).await?))
}

/// `POST /api/filters`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<NewFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = auth.require_candidate()?;
    let filter = filters::create(&state.pool, user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(filter)))
}

/// `DELETE /api/filters/{id}`
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user_id = auth.require_candidate()?;
    filters::delete(&state.pool, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/filters/{id}/jobs` — run a saved filter as a job search.
pub async fn jobs(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Page<JobOffer>>, ApiError> {
    let user_id = auth.require_candidate()?;
    let filter = filters::get(&state.pool, user_id, id).await?;
    let search = JobSearch { page: pagination.page, limit: pagination.limit, ..filter.to_search() };
    Ok(Json(jobs::search(&state.pool, &search).await?))
}
