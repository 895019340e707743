//! Handlers for the `/tasks` resource, including the completion endpoint.

use axum::extract::{Path, State};
use axum::Json;
use questline_core::error::CoreError;
use questline_core::types::DbId;
use questline_db::models::completion::ProofRef;
use questline_db::models::task::{CreateTask, Task, UpdateTask};
use questline_db::repositories::TaskRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::completion::{self, CompletionResult};
use crate::state::AppState;

/// Request body for `POST /tasks/{id}/complete`.
#[derive(Debug, Deserialize)]
pub struct CompleteTaskRequest {
    #[serde(default)]
    pub proof_url: Option<String>,
    #[serde(default)]
    pub proof_type: Option<String>,
}

/// POST /api/v1/tasks
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTask>,
) -> AppResult<Json<DataResponse<Task>>> {
    if input.title.trim().is_empty() {
        return Err(CoreError::Validation("Title cannot be empty".into()).into());
    }
    if input.squad_id.is_some() && input.community_id.is_some() {
        return Err(CoreError::Validation(
            "A task may target a squad or a community, not both".into(),
        )
        .into());
    }

    let task = TaskRepo::create(&state.pool, user.user_id, &input).await?;
    tracing::info!(task_id = task.id, user_id = user.user_id, "Task created");
    Ok(Json(DataResponse { data: task }))
}

/// GET /api/v1/tasks
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let tasks = TaskRepo::list_for_user(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/tasks/{id}
pub async fn get(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = TaskRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|t| t.user_id == user.user_id)
        .ok_or(CoreError::NotFound { entity: "task", id })?;
    Ok(Json(DataResponse { data: task }))
}

/// PATCH /api/v1/tasks/{id}
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTask>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = TaskRepo::update(&state.pool, id, user.user_id, &input)
        .await?
        .ok_or(CoreError::NotFound { entity: "task", id })?;
    Ok(Json(DataResponse { data: task }))
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let deleted = TaskRepo::delete(&state.pool, id, user.user_id).await?;
    if !deleted {
        return Err(CoreError::NotFound { entity: "task", id }.into());
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// POST /api/v1/tasks/{id}/complete
///
/// Run the completion pipeline. 404 for missing/unowned/inactive tasks,
/// 409 `ALREADY_COMPLETED` for a same-day repeat.
pub async fn complete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteTaskRequest>,
) -> AppResult<Json<DataResponse<CompletionResult>>> {
    let proof = input.proof_url.map(|proof_url| ProofRef {
        proof_url,
        proof_type: input.proof_type,
    });
    let result = completion::complete_task(&state, id, user.user_id, proof).await?;
    Ok(Json(DataResponse { data: result }))
}
