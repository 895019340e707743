//! Handlers for the `/notifications` resource.

use axum::extract::{Query, State};
use axum::Json;
use questline_db::models::notification::Notification;
use questline_db::repositories::NotificationRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// GET /api/v1/notifications
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200);
    let notifications =
        NotificationRepo::list_for_user(&state.pool, user.user_id, params.unread_only, limit, 0)
            .await?;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// POST /api/v1/notifications/read
///
/// Mark every notification for the caller as read.
pub async fn mark_all_read(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = NotificationRepo::mark_all_read(&state.pool, user.user_id).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}
