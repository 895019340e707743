//! Direct-message conversations: sending, editing, deleting, read receipts.
//!
//! Participant checks always go against the `conversations` row, never
//! against WebSocket room membership, so a stale room join can never leak
//! messages.

use questline_core::error::CoreError;
use questline_core::types::DbId;
use questline_db::models::conversation::{Conversation, ConversationListing};
use questline_db::models::message::{CreateMessage, Message};
use questline_db::repositories::{
    ConversationRepo, MessageRepo, NotificationRepo, UserRepo,
};

use crate::error::AppError;
use crate::state::AppState;
use crate::ws::protocol::ServerEvent;
use crate::ws::{conversation_room, user_room};

/// Maximum accepted message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 4_000;

/// Minutes after sending during which a message may be edited (once).
pub const EDIT_WINDOW_MINUTES: i64 = 15;

/// Notification kind for an incoming direct message.
pub const NOTIFICATION_MESSAGE_RECEIVED: &str = "message_received";

/// Open (or return the existing) conversation between the caller and a peer.
pub async fn start_conversation(
    state: &AppState,
    user_id: DbId,
    peer_id: DbId,
) -> Result<Conversation, AppError> {
    if user_id == peer_id {
        return Err(CoreError::Validation(
            "Cannot start a conversation with yourself".into(),
        )
        .into());
    }
    let peer = UserRepo::find_by_id(&state.pool, peer_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "user",
            id: peer_id,
        })?;

    let conversation = ConversationRepo::find_or_create(&state.pool, user_id, peer.id).await?;
    Ok(conversation)
}

/// Conversations the caller participates in, with unread counts.
pub async fn list_conversations(
    state: &AppState,
    user_id: DbId,
) -> Result<Vec<ConversationListing>, AppError> {
    Ok(ConversationRepo::list_for_user(&state.pool, user_id).await?)
}

/// Verify the caller participates in a conversation (typing relays use
/// this before broadcasting anything).
pub async fn ensure_participant(
    state: &AppState,
    conversation_id: DbId,
    user_id: DbId,
) -> Result<(), AppError> {
    load_for_participant(state, conversation_id, user_id).await?;
    Ok(())
}

/// Load a conversation and verify the caller participates in it.
async fn load_for_participant(
    state: &AppState,
    conversation_id: DbId,
    user_id: DbId,
) -> Result<Conversation, AppError> {
    let conversation = ConversationRepo::find_by_id(&state.pool, conversation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "conversation",
            id: conversation_id,
        })?;
    if !conversation.has_participant(user_id) {
        return Err(CoreError::Forbidden("Not a participant in this conversation".into()).into());
    }
    Ok(conversation)
}

/// Message history for a conversation, newest first.
pub async fn list_messages(
    state: &AppState,
    conversation_id: DbId,
    user_id: DbId,
    limit: i64,
    offset: i64,
) -> Result<Vec<Message>, AppError> {
    load_for_participant(state, conversation_id, user_id).await?;
    Ok(MessageRepo::list_for_conversation(&state.pool, conversation_id, limit, offset).await?)
}

/// Send a message into a conversation the sender participates in.
///
/// Persists the message, bumps the conversation's `last_message_at`,
/// broadcasts `message:new` to the conversation room, and creates a
/// notification for the other participant (pushed to their personal room).
pub async fn send_message(
    state: &AppState,
    sender_id: DbId,
    conversation_id: DbId,
    content: &str,
    image_url: Option<String>,
    reply_to_id: Option<DbId>,
) -> Result<Message, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CoreError::Validation("Message content cannot be empty".into()).into());
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Message content exceeds {MAX_MESSAGE_LENGTH} characters"
        ))
        .into());
    }

    let conversation = load_for_participant(state, conversation_id, sender_id).await?;

    // A reply must point at a message in the same conversation.
    if let Some(reply_id) = reply_to_id {
        let parent = MessageRepo::find_by_id(&state.pool, reply_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "message",
                id: reply_id,
            })?;
        if parent.conversation_id != conversation_id {
            return Err(CoreError::Validation(
                "Reply target belongs to a different conversation".into(),
            )
            .into());
        }
    }

    let message = MessageRepo::create(
        &state.pool,
        &CreateMessage {
            conversation_id,
            sender_id,
            content: content.to_string(),
            image_url,
            reply_to_id,
        },
    )
    .await?;

    state
        .ws_manager
        .send_to_room(
            &conversation_room(conversation_id),
            ServerEvent::MessageNew {
                message: message.clone(),
            }
            .to_message(),
        )
        .await;

    // Notify the peer even if they have no socket in the conversation room;
    // the row also feeds the REST notification list.
    if let Some(peer_id) = conversation.peer_of(sender_id) {
        let payload = serde_json::json!({
            "conversation_id": conversation_id,
            "message_id": message.id,
            "sender_id": sender_id,
        });
        let notification =
            NotificationRepo::create(&state.pool, peer_id, NOTIFICATION_MESSAGE_RECEIVED, &payload)
                .await?;
        state
            .ws_manager
            .send_to_room(
                &user_room(peer_id),
                ServerEvent::NotificationNew { notification }.to_message(),
            )
            .await;
    }

    Ok(message)
}

/// Edit a message: sender only, within 15 minutes of sending, at most once,
/// and never after deletion. Returns the updated message.
pub async fn edit_message(
    state: &AppState,
    message_id: DbId,
    sender_id: DbId,
    content: &str,
) -> Result<Message, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CoreError::Validation("Message content cannot be empty".into()).into());
    }

    let existing = MessageRepo::find_by_id(&state.pool, message_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "message",
            id: message_id,
        })?;
    if existing.sender_id != sender_id {
        return Err(CoreError::Forbidden("Only the sender can edit a message".into()).into());
    }
    if existing.deleted_at.is_some() {
        return Err(CoreError::Validation("Cannot edit a deleted message".into()).into());
    }
    if existing.edited_at.is_some() {
        return Err(CoreError::Validation("Message has already been edited".into()).into());
    }

    // The UPDATE re-checks every condition including the time window, so a
    // racing second edit affects zero rows and falls through to the error.
    let updated = MessageRepo::edit(&state.pool, message_id, sender_id, content, EDIT_WINDOW_MINUTES)
        .await?
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Messages can only be edited within {EDIT_WINDOW_MINUTES} minutes of sending"
            ))
        })?;

    state
        .ws_manager
        .send_to_room(
            &conversation_room(updated.conversation_id),
            ServerEvent::MessageNew {
                message: updated.clone(),
            }
            .to_message(),
        )
        .await;

    Ok(updated)
}

/// Soft-delete a message (sender only). The row remains for history; readers
/// render a tombstone.
pub async fn delete_message(
    state: &AppState,
    message_id: DbId,
    sender_id: DbId,
) -> Result<(), AppError> {
    let existing = MessageRepo::find_by_id(&state.pool, message_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "message",
            id: message_id,
        })?;
    if existing.sender_id != sender_id {
        return Err(CoreError::Forbidden("Only the sender can delete a message".into()).into());
    }

    let deleted = MessageRepo::soft_delete(&state.pool, message_id, sender_id).await?;
    if !deleted {
        // Already deleted; treat as success so deletes are idempotent.
        return Ok(());
    }

    state
        .ws_manager
        .send_to_room(
            &conversation_room(existing.conversation_id),
            ServerEvent::MessageNew {
                message: Message {
                    deleted_at: Some(chrono::Utc::now()),
                    ..existing
                },
            }
            .to_message(),
        )
        .await;

    Ok(())
}

/// Move the caller's read watermark for a conversation to now.
pub async fn mark_read(
    state: &AppState,
    conversation_id: DbId,
    user_id: DbId,
) -> Result<(), AppError> {
    load_for_participant(state, conversation_id, user_id).await?;
    ConversationRepo::mark_read(&state.pool, conversation_id, user_id).await?;
    Ok(())
}
