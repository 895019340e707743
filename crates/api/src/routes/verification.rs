//! Route definitions for the `/verification` moderation resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::verification;
use crate::state::AppState;

/// Routes mounted at `/verification`.
///
/// ```text
/// GET  /queue             -> pending entries for the caller
/// POST /{id}/approve      -> approve (credits XP once)
/// POST /{id}/reject       -> reject with optional reason
/// POST /{id}/ai-verify    -> AI-assisted judgement
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/queue", get(verification::queue))
        .route("/{id}/approve", post(verification::approve))
        .route("/{id}/reject", post(verification::reject))
        .route("/{id}/ai-verify", post(verification::ai_verify))
}
