//! Repository for the `conversations` and `conversation_reads` tables.

use questline_core::types::DbId;
use sqlx::PgPool;

use crate::models::conversation::{Conversation, ConversationListing};

/// Column list for `conversations` queries.
const COLUMNS: &str = "id, user_a, user_b, last_message_at, created_at";

/// Provides two-party conversation persistence.
pub struct ConversationRepo;

impl ConversationRepo {
    /// Find the conversation between two users, creating it lazily on first
    /// contact. The pair is normalized (`user_a < user_b`) so either caller
    /// order resolves to the same row; the upsert makes concurrent first
    /// messages converge on one conversation.
    pub async fn find_or_create(
        pool: &PgPool,
        user_id: DbId,
        peer_id: DbId,
    ) -> Result<Conversation, sqlx::Error> {
        let (a, b) = if user_id < peer_id {
            (user_id, peer_id)
        } else {
            (peer_id, user_id)
        };
        let query = format!(
            "INSERT INTO conversations (user_a, user_b) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_conversations_pair \
             DO UPDATE SET user_a = EXCLUDED.user_a \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(a)
            .bind(b)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Conversation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM conversations WHERE id = $1");
        sqlx::query_as::<_, Conversation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Conversations for a user with peer info and unread counts, most
    /// recently active first. Unread state is computed against the caller's
    /// `conversation_reads` watermark; read receipts never broadcast, they
    /// only move this watermark.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ConversationListing>, sqlx::Error> {
        sqlx::query_as::<_, ConversationListing>(
            "SELECT cv.id, \
                    CASE WHEN cv.user_a = $1 THEN cv.user_b ELSE cv.user_a END AS peer_id, \
                    u.username AS peer_username, \
                    cv.last_message_at, \
                    (SELECT COUNT(*) FROM messages m \
                     WHERE m.conversation_id = cv.id \
                       AND m.sender_id <> $1 \
                       AND m.deleted_at IS NULL \
                       AND m.created_at > COALESCE( \
                           (SELECT r.last_read_at FROM conversation_reads r \
                            WHERE r.conversation_id = cv.id AND r.user_id = $1), \
                           'epoch'::timestamptz)) AS unread_count \
             FROM conversations cv \
             JOIN users u ON u.id = CASE WHEN cv.user_a = $1 THEN cv.user_b ELSE cv.user_a END \
             WHERE cv.user_a = $1 OR cv.user_b = $1 \
             ORDER BY cv.last_message_at DESC NULLS LAST",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Move the caller's read watermark to now.
    pub async fn mark_read(
        pool: &PgPool,
        conversation_id: DbId,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO conversation_reads (conversation_id, user_id, last_read_at) \
             VALUES ($1, $2, NOW()) \
             ON CONFLICT ON CONSTRAINT uq_conversation_reads \
             DO UPDATE SET last_read_at = NOW()",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
