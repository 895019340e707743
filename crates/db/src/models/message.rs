//! Message entity models and DTOs.

use questline_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub conversation_id: DbId,
    pub sender_id: DbId,
    pub content: String,
    pub image_url: Option<String>,
    pub reply_to_id: Option<DbId>,
    pub edited_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for inserting a message.
#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub conversation_id: DbId,
    pub sender_id: DbId,
    pub content: String,
    pub image_url: Option<String>,
    pub reply_to_id: Option<DbId>,
}

/// DTO for the single allowed content edit.
#[derive(Debug, Deserialize)]
pub struct EditMessage {
    pub content: String,
}
