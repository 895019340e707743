pub mod auth;
pub mod health;
pub mod messages;
pub mod notification;
pub mod tasks;
pub mod verification;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                   WebSocket (token handshake)
///
/// /auth/register                        register (public)
/// /auth/login                           login (public)
/// /auth/refresh                         refresh (public)
/// /auth/logout                          logout (requires auth)
///
/// /tasks                                list, create
/// /tasks/{id}                           get, update (PATCH), delete
/// /tasks/{id}/complete                  completion pipeline (POST)
///
/// /verification/queue                   moderation worklist (GET)
/// /verification/{id}/approve            approve entry (POST)
/// /verification/{id}/reject             reject entry (POST)
/// /verification/{id}/ai-verify          AI-assisted judgement (POST)
///
/// /conversations                        list, lazy create
/// /conversations/{id}/messages          history (GET), send (POST)
/// /conversations/{id}/read              move read watermark (POST)
/// /messages/{id}                        edit (PATCH), soft delete (DELETE)
///
/// /notifications                        list (?unread_only, limit)
/// /notifications/read                   mark all read (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        // Authentication routes.
        .nest("/auth", auth::router())
        // Task CRUD + completion pipeline.
        .nest("/tasks", tasks::router())
        // Moderation worklist and resolutions.
        .nest("/verification", verification::router())
        // Direct messaging (REST fallback; live path is the WebSocket).
        .merge(messages::router())
        // Notifications.
        .nest("/notifications", notification::router())
}
