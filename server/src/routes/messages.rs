//! Messaging routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::services::accounts::Role;
use crate::services::messages::{self, Message, MessageQuery, NewMessage, Party};
use crate::services::pagination::Page;
use crate::state::AppState;

/// Candidates and companies take part in conversations; admins do not.
fn party(auth: &AuthUser) -> Result<Party, ApiError> {
    match auth.role() {
        Role::Candidate => Ok(Party::User(auth.id())),
        Role::Company => Ok(Party::Company(auth.id())),
        Role::Admin => Err(ApiError::Forbidden("admin accounts have no inbox".into())),
    }
}

/// `GET /api/messages[?with=<id>]`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<MessageQuery>,
) -> Result<Json<Page<Message>>, ApiError> {
    let party = party(&auth)?;
    Ok(Json(messages::list(&state.pool, party, &query).await?))
}

/// `POST /api/messages`
pub async fn send(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<NewMessage>,
) -> Result<impl IntoResponse, ApiError> {
    let party = party(&auth)?;
    let message = messages::send(&state.pool, party, &body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `PUT /api/messages/{id}/read`
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let party = party(&auth)?;
    Ok(Json(messages::mark_read(&state.pool, party, id).await?))
}
