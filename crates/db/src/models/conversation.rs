//! Conversation models for two-party direct messaging.

use questline_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `conversations` table. `user_a < user_b` always
/// (`ck_conversations_ordered`), so a pair maps to at most one row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Conversation {
    pub id: DbId,
    pub user_a: DbId,
    pub user_b: DbId,
    pub last_message_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Conversation {
    /// Whether a user participates in this conversation.
    pub fn has_participant(&self, user_id: DbId) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }

    /// The other participant, for notification delivery.
    pub fn peer_of(&self, user_id: DbId) -> Option<DbId> {
        if self.user_a == user_id {
            Some(self.user_b)
        } else if self.user_b == user_id {
            Some(self.user_a)
        } else {
            None
        }
    }
}

/// A conversation listed for a user, with unread count computed from
/// `conversation_reads`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConversationListing {
    pub id: DbId,
    pub peer_id: DbId,
    pub peer_username: String,
    pub last_message_at: Option<Timestamp>,
    pub unread_count: i64,
}
