//! WebSocket upgrade handler and per-connection event loop.
//!
//! The handshake is authenticated *before* the upgrade: the access token
//! comes from the `?token=` query parameter (browsers cannot set headers on
//! WebSocket requests) or the `Authorization` header. Unauthenticated
//! upgrade attempts get a plain 401.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use questline_core::error::CoreError;
use questline_core::types::DbId;
use questline_db::repositories::{ConversationRepo, FriendshipRepo, MembershipRepo, UserRepo};
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::services::messaging;
use crate::state::AppState;
use crate::ws::manager::{community_room, conversation_room, squad_room, user_room};
use crate::ws::protocol::{ClientEvent, ServerEvent};

/// Presence statuses a client may set explicitly.
const SETTABLE_STATUSES: &[&str] = &["online", "busy"];

#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    token: Option<String>,
}

/// HTTP handler that authenticates and upgrades the connection to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let token = params
        .token
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(String::from)
        })
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing WebSocket token".into()))
        })?;

    let claims = validate_token(&token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, claims.sub)))
}

/// Manage a single authenticated WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection and joins rooms from persisted memberships.
///   2. On an offline-to-online edge, flips the user's status and notifies
///      accepted friends.
///   3. Spawns a sender task that forwards messages from the manager channel.
///   4. Dispatches inbound client events on the current task.
///   5. Cleans up on disconnect, broadcasting offline on the last close.
async fn handle_socket(socket: WebSocket, state: AppState, user_id: DbId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let (mut rx, came_online) = state.ws_manager.add(conn_id.clone(), user_id).await;

    if let Err(e) = join_initial_rooms(&state, user_id, &conn_id).await {
        tracing::warn!(conn_id = %conn_id, error = %e, "Failed to join initial rooms");
    }

    if came_online {
        set_and_broadcast_presence(&state, user_id, "online").await;
    }

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: dispatch inbound client events.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                let event = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        send_error(&state, &conn_id, format!("Unrecognized event: {e}")).await;
                        continue;
                    }
                };
                if let Err(e) = handle_client_event(&state, user_id, &conn_id, event).await {
                    send_error(&state, &conn_id, e.to_string()).await;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    if let Some((_, went_offline)) = state.ws_manager.remove(&conn_id).await {
        if went_offline {
            set_and_broadcast_presence(&state, user_id, "offline").await;
        }
    }
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket disconnected");
}

/// Join the personal room plus every squad, community, and conversation room
/// the user belongs to.
async fn join_initial_rooms(
    state: &AppState,
    user_id: DbId,
    conn_id: &str,
) -> Result<(), AppError> {
    let manager = &state.ws_manager;
    manager.join_room(&user_room(user_id), conn_id).await;

    for squad_id in MembershipRepo::squad_ids_for_user(&state.pool, user_id).await? {
        manager.join_room(&squad_room(squad_id), conn_id).await;
    }
    for community_id in MembershipRepo::community_ids_for_user(&state.pool, user_id).await? {
        manager
            .join_room(&community_room(community_id), conn_id)
            .await;
    }
    for listing in ConversationRepo::list_for_user(&state.pool, user_id).await? {
        manager
            .join_room(&conversation_room(listing.id), conn_id)
            .await;
    }
    Ok(())
}

/// Persist a presence status and broadcast it to accepted friends.
///
/// `last_seen_at` is only stamped on the offline transition so it records
/// when the user was last connected.
async fn set_and_broadcast_presence(state: &AppState, user_id: DbId, status: &str) {
    let last_seen = (status == "offline").then(chrono::Utc::now);
    if let Err(e) = UserRepo::set_status(&state.pool, user_id, status, last_seen).await {
        tracing::error!(user_id, error = %e, "Failed to persist presence status");
    }

    let friends = match FriendshipRepo::accepted_friend_ids(&state.pool, user_id).await {
        Ok(friends) => friends,
        Err(e) => {
            tracing::error!(user_id, error = %e, "Failed to load friends for presence broadcast");
            return;
        }
    };

    let event = ServerEvent::PresenceUpdate {
        user_id,
        status: status.to_string(),
    };
    for friend_id in friends {
        state
            .ws_manager
            .send_to_user(friend_id, event.to_message())
            .await;
    }
}

/// Push an error frame to a single connection.
async fn send_error(state: &AppState, conn_id: &str, message: String) {
    state
        .ws_manager
        .send_to_conn(conn_id, ServerEvent::Error { message }.to_message())
        .await;
}

/// Dispatch one parsed client event.
async fn handle_client_event(
    state: &AppState,
    user_id: DbId,
    conn_id: &str,
    event: ClientEvent,
) -> Result<(), AppError> {
    match event {
        ClientEvent::MessageSend {
            conversation_id,
            content,
            image_url,
            reply_to_id,
        } => {
            messaging::send_message(state, user_id, conversation_id, &content, image_url, reply_to_id)
                .await?;
        }
        ClientEvent::Typing {
            conversation_id,
            is_typing,
        } => {
            messaging::ensure_participant(state, conversation_id, user_id).await?;
            state
                .ws_manager
                .send_to_room_excluding(
                    &conversation_room(conversation_id),
                    Some(conn_id),
                    ServerEvent::Typing {
                        conversation_id,
                        user_id,
                        is_typing,
                    }
                    .to_message(),
                )
                .await;
        }
        ClientEvent::MarkRead { conversation_id } => {
            messaging::mark_read(state, conversation_id, user_id).await?;
        }
        ClientEvent::PresenceUpdate { status } => {
            if !SETTABLE_STATUSES.contains(&status.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Status must be one of: {}",
                    SETTABLE_STATUSES.join(", ")
                ))
                .into());
            }
            set_and_broadcast_presence(state, user_id, &status).await;
        }
        ClientEvent::RoomJoin { room } => {
            authorize_room(state, user_id, &room).await?;
            state.ws_manager.join_room(&room, conn_id).await;
        }
        ClientEvent::RoomLeave { room } => {
            state.ws_manager.leave_room(&room, conn_id).await;
        }
    }
    Ok(())
}

/// Check that the user may join a named room.
///
/// Room grammar is `{kind}:{id}`; membership is checked against persisted
/// records, so joining a room is never a way to gain access.
async fn authorize_room(state: &AppState, user_id: DbId, room: &str) -> Result<(), AppError> {
    use questline_core::verification::VerificationTarget;

    let denied =
        || AppError::Core(CoreError::Forbidden(format!("Cannot join room '{room}'")));

    let (kind, id) = room.split_once(':').ok_or_else(denied)?;
    let id: DbId = id.parse().map_err(|_| denied())?;

    match kind {
        "user" => {
            if id != user_id {
                return Err(denied());
            }
        }
        "squad" => {
            let role =
                MembershipRepo::role_for(&state.pool, user_id, VerificationTarget::Squad(id))
                    .await?;
            if role.is_none() {
                return Err(denied());
            }
        }
        "community" => {
            let role =
                MembershipRepo::role_for(&state.pool, user_id, VerificationTarget::Community(id))
                    .await?;
            if role.is_none() {
                return Err(denied());
            }
        }
        "conversation" => {
            messaging::ensure_participant(state, id, user_id)
                .await
                .map_err(|_| denied())?;
        }
        _ => return Err(denied()),
    }
    Ok(())
}
