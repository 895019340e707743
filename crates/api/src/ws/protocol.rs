//! Wire protocol for the realtime WebSocket channel.
//!
//! Both directions use tagged JSON: `{"type": "message:send", ...}`.
//! Client events that fail to parse are answered with an `error` frame
//! rather than closing the connection.

use questline_core::types::DbId;
use questline_db::models::message::Message as ChatMessage;
use questline_db::models::notification::Notification;
use serde::{Deserialize, Serialize};

/// Events a client may send over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Send a chat message into a conversation the user participates in.
    #[serde(rename = "message:send")]
    MessageSend {
        conversation_id: DbId,
        content: String,
        #[serde(default)]
        image_url: Option<String>,
        #[serde(default)]
        reply_to_id: Option<DbId>,
    },
    /// Typing indicator; relayed to the conversation room, never persisted.
    #[serde(rename = "message:typing")]
    Typing {
        conversation_id: DbId,
        is_typing: bool,
    },
    /// Move the caller's read watermark for a conversation to now.
    #[serde(rename = "message:read")]
    MarkRead { conversation_id: DbId },
    /// Explicit presence status change (`online` / `busy`).
    #[serde(rename = "presence:update")]
    PresenceUpdate { status: String },
    /// Join a room mid-session (e.g. after joining a squad).
    #[serde(rename = "room:join")]
    RoomJoin { room: String },
    /// Leave a room mid-session.
    #[serde(rename = "room:leave")]
    RoomLeave { room: String },
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A new chat message in a conversation the client has joined.
    #[serde(rename = "message:new")]
    MessageNew { message: ChatMessage },
    /// Another participant is (or stopped) typing.
    #[serde(rename = "message:typing")]
    Typing {
        conversation_id: DbId,
        user_id: DbId,
        is_typing: bool,
    },
    /// A new notification for this user.
    #[serde(rename = "notification:new")]
    NotificationNew { notification: Notification },
    /// A friend's presence changed.
    #[serde(rename = "presence:update")]
    PresenceUpdate { user_id: DbId, status: String },
    /// A verification queue entry the user cares about was resolved.
    #[serde(rename = "verification:update")]
    VerificationUpdate {
        entry_id: DbId,
        completion_id: DbId,
        status: String,
    },
    /// XP totals changed for a user visible to this client.
    #[serde(rename = "leaderboard:update")]
    LeaderboardUpdate { user_id: DbId, total_xp: i64 },
    /// The last client event could not be processed.
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerEvent {
    /// Serialize into a WebSocket text frame.
    ///
    /// Serialization of these variants cannot fail in practice; a failure
    /// is logged and turned into a plain error frame.
    pub fn to_message(&self) -> axum::extract::ws::Message {
        let json = serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize server event");
            r#"{"type":"error","message":"internal serialization error"}"#.to_string()
        });
        axum::extract::ws::Message::Text(json.into())
    }
}
