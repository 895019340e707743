//! Repository for the `messages` table.

use questline_core::types::DbId;
use sqlx::PgPool;

use crate::models::message::{CreateMessage, Message};

/// Column list for `messages` queries.
const COLUMNS: &str = "id, conversation_id, sender_id, content, image_url, reply_to_id, \
     edited_at, deleted_at, created_at";

/// Provides message persistence.
pub struct MessageRepo;

impl MessageRepo {
    /// Insert a message and bump the conversation's last-activity timestamp
    /// in one transaction. The caller has already checked participation and
    /// that any `reply_to_id` belongs to the same conversation.
    pub async fn create(pool: &PgPool, input: &CreateMessage) -> Result<Message, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO messages (conversation_id, sender_id, content, image_url, reply_to_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let message = sqlx::query_as::<_, Message>(&query)
            .bind(input.conversation_id)
            .bind(input.sender_id)
            .bind(&input.content)
            .bind(&input.image_url)
            .bind(input.reply_to_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE conversations SET last_message_at = NOW() WHERE id = $1")
            .bind(input.conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(message)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Message>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM messages WHERE id = $1");
        sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Message history for a conversation, newest first.
    pub async fn list_for_conversation(
        pool: &PgPool,
        conversation_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages \
             WHERE conversation_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Apply the single allowed content edit. The guard repeats the
    /// handler-level checks (sender, not deleted, never edited, inside the
    /// window) so a racing second edit affects zero rows.
    pub async fn edit(
        pool: &PgPool,
        id: DbId,
        sender_id: DbId,
        content: &str,
        window_minutes: i64,
    ) -> Result<Option<Message>, sqlx::Error> {
        let query = format!(
            "UPDATE messages \
             SET content = $3, edited_at = NOW() \
             WHERE id = $1 AND sender_id = $2 \
               AND deleted_at IS NULL AND edited_at IS NULL \
               AND created_at > NOW() - make_interval(mins => $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .bind(sender_id)
            .bind(content)
            .bind(window_minutes as i32)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a message. Content stays in place; readers filter on
    /// `deleted_at`.
    pub async fn soft_delete(
        pool: &PgPool,
        id: DbId,
        sender_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET deleted_at = NOW() \
             WHERE id = $1 AND sender_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(sender_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
