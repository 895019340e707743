//! Handlers for the `/verification` moderation resource.

use axum::extract::{Path, State};
use axum::Json;
use questline_core::types::DbId;
use questline_db::models::completion::TaskCompletion;
use questline_db::models::verification::QueueListing;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::verification::{self, AiVerifyResult};
use crate::state::AppState;

/// Request body for `POST /verification/{id}/reject`.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// GET /api/v1/verification/queue
///
/// Pending entries the caller may moderate, highest priority first then
/// oldest first.
pub async fn queue(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<QueueListing>>>> {
    let entries = verification::list_pending(&state, user.user_id).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// POST /api/v1/verification/{id}/approve
pub async fn approve(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TaskCompletion>>> {
    let completion = verification::approve(&state, id, user.user_id).await?;
    tracing::info!(entry_id = id, verifier_id = user.user_id, "Completion approved");
    Ok(Json(DataResponse { data: completion }))
}

/// POST /api/v1/verification/{id}/reject
pub async fn reject(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectRequest>,
) -> AppResult<Json<DataResponse<TaskCompletion>>> {
    let completion =
        verification::reject(&state, id, user.user_id, input.reason.as_deref()).await?;
    tracing::info!(entry_id = id, verifier_id = user.user_id, "Completion rejected");
    Ok(Json(DataResponse { data: completion }))
}

/// POST /api/v1/verification/{id}/ai-verify
///
/// Run the configured AI judge. Judge failures come back as a
/// zero-confidence judgement with the entry left pending, never as an error.
pub async fn ai_verify(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AiVerifyResult>>> {
    let result = verification::ai_verify(&state, id, user.user_id).await?;
    tracing::info!(
        entry_id = id,
        confidence = result.judgement.confidence,
        auto_approved = result.auto_approved,
        "AI verification completed"
    );
    Ok(Json(DataResponse { data: result }))
}
