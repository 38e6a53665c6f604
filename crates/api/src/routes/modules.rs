use axum::routing::get;
use axum::Router;

use crate::handlers::modules;
use crate::state::AppState;

/// Routes mounted at `/modules`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(modules::list_modules))
}
