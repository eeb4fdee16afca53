//! Admin dashboard and moderation routes. Every handler requires the admin role.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiPath, ApiQuery};
use crate::services::accounts::{CompanyProfile, UserProfile};
use crate::services::admin::{self, AdminStats};
use crate::services::companies;
use crate::services::pagination::{Page, Pagination};
use crate::state::AppState;

/// `GET /api/admin/stats`
pub async fn stats(State(state): State<AppState>, auth: AuthUser) -> Result<Json<AdminStats>, ApiError> {
    auth.require_admin()?;
    Ok(Json(admin::stats(&state.pool).await?))
}

/// `GET /api/admin/users`
pub async fn users(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Page<UserProfile>>, ApiError> {
    auth.require_admin()?;
    Ok(Json(admin::list_users(&state.pool, pagination).await?))
}

/// `GET /api/admin/companies`
pub async fn companies(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Page<CompanyProfile>>, ApiError> {
    auth.require_admin()?;
    Ok(Json(companies::list(&state.pool, pagination).await?))
}

/// `DELETE /api/admin/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let admin_id = auth.require_admin()?;
    admin::delete_user(&state.pool, admin_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/admin/companies/{id}`
pub async fn delete_company(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    admin::delete_company(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/admin/jobs/{id}`
pub async fn delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    admin::delete_job(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
