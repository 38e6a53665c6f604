pub mod health;
pub mod modules;
pub mod tasks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /modules                                  supported modules (GET)
///
/// /tasks                                    list by owner (GET), start (POST)
/// /tasks/{correlation_id}                   progress + result page (GET)
/// /tasks/{correlation_id}/stop              stop (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/modules", modules::router())
        .nest("/tasks", tasks::router())
}
