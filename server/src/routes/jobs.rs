//! Job offer routes: public search, company CRUD, matching and applicants.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::services::applications::{self, RankedApplicant};
use crate::services::jobs::{self, JobInput, JobOffer, JobSearch};
use crate::services::matching::{self, CandidateSignals, JobSignals, MatchBreakdown, ScoredJob};
use crate::services::pagination::{MAX_LIMIT, Page, Pagination};
use crate::services::users;
use crate::state::AppState;

#[derive(Serialize)]
pub struct MatchResponse {
    pub job_id: Uuid,
    pub score: u8,
    pub breakdown: MatchBreakdown,
}

/// `GET /api/jobs`
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(search): ApiQuery<JobSearch>,
) -> Result<Json<Page<JobOffer>>, ApiError> {
    Ok(Json(jobs::search(&state.pool, &search).await?))
}

/// `GET /api/jobs/recommended` — the newest active offers, best match first.
pub async fn recommended(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Vec<ScoredJob>>, ApiError> {
    let user_id = auth.require_candidate()?;
    let user = users::get_profile(&state.pool, user_id).await?;
    let recent = jobs::search(&state.pool, &JobSearch { limit: Some(MAX_LIMIT), ..JobSearch::default() }).await?;
    let limit = usize::try_from(pagination.limit()).unwrap_or(usize::MAX);
    Ok(Json(matching::recommend(&user, recent.items, limit)))
}

/// `GET /api/jobs/{id}`
pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<JobOffer>, ApiError> {
    Ok(Json(jobs::get(&state.pool, id).await?))
}

/// `POST /api/jobs`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<JobInput>,
) -> Result<impl IntoResponse, ApiError> {
    let company_id = auth.require_company()?;
    let job = jobs::create(&state.pool, company_id, &body).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// `PUT /api/jobs/{id}`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<JobInput>,
) -> Result<Json<JobOffer>, ApiError> {
    let company_id = auth.require_company()?;
    Ok(Json(jobs::update(&state.pool, company_id, id, &body).await?))
}

/// `DELETE /api/jobs/{id}`
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let company_id = auth.require_company()?;
    jobs::delete(&state.pool, company_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/jobs/{id}/match` — the caller's compatibility with this offer.
pub async fn match_score(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MatchResponse>, ApiError> {
    let user_id = auth.require_candidate()?;
    let job = jobs::get(&state.pool, id).await?;
    let user = users::get_profile(&state.pool, user_id).await?;
    let breakdown = matching::breakdown(&CandidateSignals::from(&user), &JobSignals::from(&job));
    Ok(Json(MatchResponse { job_id: job.id, score: breakdown.score, breakdown }))
}

/// `GET /api/jobs/{id}/applications` — best matches first.
pub async fn applicants(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<RankedApplicant>>, ApiError> {
    let company_id = auth.require_company()?;
    Ok(Json(applications::ranked_for_job(&state.pool, company_id, id).await?))
}
