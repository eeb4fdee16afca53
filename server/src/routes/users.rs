//! Candidate profile routes.

use axum::extract::State;
use axum::response::Json;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiJson, ApiPath};
use crate::services::accounts::{Role, UserProfile};
use crate::services::users::{self, ProfileUpdate};
use crate::state::AppState;

/// `GET /api/users/me`
pub async fn get_me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserProfile>, ApiError> {
    let id = auth.require_candidate()?;
    Ok(Json(users::get_profile(&state.pool, id).await?))
}

/// `PUT /api/users/me`
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    let id = auth.require_candidate()?;
    Ok(Json(users::update_profile(&state.pool, id, &body).await?))
}

/// `GET /api/users/{id}` — companies browsing applicants, admins moderating.
pub async fn get_candidate(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    auth.require(&[Role::Company, Role::Admin])?;
    Ok(Json(users::get_candidate(&state.pool, id).await?))
}
