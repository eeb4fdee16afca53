//! Candidate/company messaging with read receipts.
//!
//! Every conversation has exactly one candidate and one company, so a row
//! stores both ids plus which side wrote it.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::pagination::{Page, Pagination};
use super::{RecordError, required_text};

const MESSAGE_COLUMNS: &str = "id, user_id, company_id, sender, body, read_at, created_at";
pub const MAX_BODY_CHARS: usize = 5000;

/// Which side of a conversation the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    User(Uuid),
    Company(Uuid),
}

impl Party {
    fn sender_tag(self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Company(_) => "company",
        }
    }

    /// `(user_id, company_id)` for a message between this party and `other`.
    fn pair_with(self, other: Uuid) -> (Uuid, Uuid) {
        match self {
            Self::User(id) => (id, other),
            Self::Company(id) => (other, id),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub sender: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Message {
    fn involves(&self, party: Party) -> bool {
        match party {
            Party::User(id) => self.user_id == id,
            Party::Company(id) => self.company_id == id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    /// Company id when a candidate writes, candidate id when a company writes.
    pub to: Uuid,
    pub body: Option<String>,
}

/// `GET /api/messages` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageQuery {
    pub with: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl MessageQuery {
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination { page: self.page, limit: self.limit }
    }
}

pub(crate) fn validate_body(body: Option<&str>) -> Result<String, RecordError> {
    let body = required_text("body", body)?;
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(RecordError::Invalid(format!("body must be at most {MAX_BODY_CHARS} characters")));
    }
    Ok(body)
}

/// Only the side that did not write a message may mark it read.
pub(crate) fn check_recipient(party: Party, message: &Message) -> Result<(), RecordError> {
    if !message.involves(party) {
        return Err(RecordError::NotFound("message"));
    }
    if message.sender == party.sender_tag() {
        return Err(RecordError::Forbidden("only the recipient can mark a message read"));
    }
    Ok(())
}

/// Messages involving `party`, newest first, optionally limited to one counterpart.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn list(pool: &PgPool, party: Party, query: &MessageQuery) -> Result<Page<Message>, RecordError> {
    let pagination = query.pagination();
    let (own_column, other_column, own_id) = match party {
        Party::User(id) => ("user_id", "company_id", id),
        Party::Company(id) => ("company_id", "user_id", id),
    };
    let filter = format!("{own_column} = $1 AND ($2::uuid IS NULL OR {other_column} = $2)");

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM messages WHERE {filter}"))
        .bind(own_id)
        .bind(query.with)
        .fetch_one(pool)
        .await?;
    let items = sqlx::query_as::<_, Message>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE {filter} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(own_id)
    .bind(query.with)
    .bind(pagination.sql_limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;
    Ok(Page::new(items, pagination, total))
}

/// # Errors
///
/// Returns `Invalid` for an empty or oversized body, `NotFound` when the
/// recipient does not exist.
pub async fn send(pool: &PgPool, party: Party, new: &NewMessage) -> Result<Message, RecordError> {
    let body = validate_body(new.body.as_deref())?;
    let (user_id, company_id) = party.pair_with(new.to);

    let message = sqlx::query_as::<_, Message>(&format!(
        "INSERT INTO messages (user_id, company_id, sender, body)
         VALUES ($1, $2, $3, $4)
         RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(company_id)
    .bind(party.sender_tag())
    .bind(&body)
    .fetch_one(pool)
    .await
    .map_err(|e| RecordError::from_insert(e, "recipient"))?;

    tracing::debug!(message_id = %message.id, %user_id, %company_id, "message sent");
    Ok(message)
}

/// Set `read_at` once; later calls keep the first timestamp.
///
/// # Errors
///
/// Returns `NotFound` or `Forbidden` per [`check_recipient`].
pub async fn mark_read(pool: &PgPool, party: Party, id: Uuid) -> Result<Message, RecordError> {
    let message = sqlx::query_as::<_, Message>(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RecordError::NotFound("message"))?;
    check_recipient(party, &message)?;

    sqlx::query_as::<_, Message>(&format!(
        "UPDATE messages SET read_at = COALESCE(read_at, now()) WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(RecordError::NotFound("message"))
}

#[cfg(test)]
#[path = "messages_test.rs"]
mod tests;
