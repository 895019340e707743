//! Handlers for the `/conversations` and `/messages` resources.
//!
//! REST is the history/offline fallback; live delivery happens over the
//! WebSocket. Both paths go through the same messaging service.

use axum::extract::{Path, Query, State};
use axum::Json;
use questline_core::types::DbId;
use questline_db::models::conversation::{Conversation, ConversationListing};
use questline_db::models::message::Message;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::messaging;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Request body for `POST /conversations`.
#[derive(Debug, Deserialize)]
pub struct StartConversationRequest {
    pub peer_id: DbId,
}

/// Request body for `POST /conversations/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub reply_to_id: Option<DbId>,
}

/// Request body for `PATCH /messages/{id}`.
#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub content: String,
}

/// Pagination query for message history.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// GET /api/v1/conversations
pub async fn list_conversations(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ConversationListing>>>> {
    let conversations = messaging::list_conversations(&state, user.user_id).await?;
    Ok(Json(DataResponse {
        data: conversations,
    }))
}

/// POST /api/v1/conversations
///
/// Open (or return the existing) conversation with a peer.
pub async fn start_conversation(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<StartConversationRequest>,
) -> AppResult<Json<DataResponse<Conversation>>> {
    let conversation = messaging::start_conversation(&state, user.user_id, input.peer_id).await?;
    Ok(Json(DataResponse { data: conversation }))
}

/// GET /api/v1/conversations/{id}/messages
pub async fn history(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<DataResponse<Vec<Message>>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);
    let messages = messaging::list_messages(&state, id, user.user_id, limit, offset).await?;
    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/conversations/{id}/messages
///
/// Send a message over REST (offline fallback; sockets get the broadcast).
pub async fn send(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SendMessageRequest>,
) -> AppResult<Json<DataResponse<Message>>> {
    let message = messaging::send_message(
        &state,
        user.user_id,
        id,
        &input.content,
        input.image_url,
        input.reply_to_id,
    )
    .await?;
    Ok(Json(DataResponse { data: message }))
}

/// POST /api/v1/conversations/{id}/read
pub async fn mark_read(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    messaging::mark_read(&state, id, user.user_id).await?;
    Ok(Json(serde_json::json!({ "read": true })))
}

/// PATCH /api/v1/messages/{id}
///
/// The single allowed edit, within 15 minutes of sending.
pub async fn edit(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<EditMessageRequest>,
) -> AppResult<Json<DataResponse<Message>>> {
    let message = messaging::edit_message(&state, id, user.user_id, &input.content).await?;
    Ok(Json(DataResponse { data: message }))
}

/// DELETE /api/v1/messages/{id}
///
/// Soft delete: the row stays for history, readers see a tombstone.
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    messaging::delete_message(&state, id, user.user_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
