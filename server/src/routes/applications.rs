//! Application routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::services::applications::{self, Application, ApplicationStatus, MyApplication, NewApplication};
use crate::services::pagination::{Page, Pagination};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// `POST /api/applications` — 409 if already applied.
pub async fn apply(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<NewApplication>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = auth.require_candidate()?;
    let application = applications::apply(&state.pool, user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// `GET /api/applications/me`
pub async fn mine(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Page<MyApplication>>, ApiError> {
    let user_id = auth.require_candidate()?;
    Ok(Json(applications::list_for_user(&state.pool, user_id, pagination).await?))
}

/// `PUT /api/applications/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<Application>, ApiError> {
    let company_id = auth.require_company()?;
    let status = ApplicationStatus::parse(body.status.trim())
        .ok_or_else(|| ApiError::BadRequest(format!("unknown status {:?}", body.status)))?;
    Ok(Json(applications::update_status(&state.pool, company_id, id, status).await?))
}

/// `DELETE /api/applications/{id}`
pub async fn withdraw(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user_id = auth.require_candidate()?;
    applications::withdraw(&state.pool, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
