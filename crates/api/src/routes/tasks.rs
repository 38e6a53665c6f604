//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /                        -> list_tasks
/// POST   /                        -> start_task
/// GET    /{correlation_id}        -> get_progress
/// POST   /{correlation_id}/stop   -> stop_task
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::start_task))
        .route("/{correlation_id}", get(tasks::get_progress))
        .route("/{correlation_id}/stop", post(tasks::stop_task))
}
