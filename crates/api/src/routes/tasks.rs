//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /               -> list
/// POST   /               -> create
/// GET    /{id}           -> get
/// PATCH  /{id}           -> update
/// DELETE /{id}           -> delete
/// POST   /{id}/complete  -> completion pipeline
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list).post(tasks::create))
        .route(
            "/{id}",
            get(tasks::get).patch(tasks::update).delete(tasks::delete),
        )
        .route("/{id}/complete", post(tasks::complete))
}
