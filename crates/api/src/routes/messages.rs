//! Route definitions for conversations and messages.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::messages;
use crate::state::AppState;

/// Routes merged at the API root (two sibling resources).
///
/// ```text
/// GET    /conversations                 -> list with unread counts
/// POST   /conversations                 -> lazy create with peer
/// GET    /conversations/{id}/messages   -> history
/// POST   /conversations/{id}/messages   -> send (REST fallback)
/// POST   /conversations/{id}/read       -> move read watermark
/// PATCH  /messages/{id}                 -> single edit within the window
/// DELETE /messages/{id}                 -> soft delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            get(messages::list_conversations).post(messages::start_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            get(messages::history).post(messages::send),
        )
        .route("/conversations/{id}/read", post(messages::mark_read))
        .route(
            "/messages/{id}",
            patch(messages::edit).delete(messages::delete),
        )
}
