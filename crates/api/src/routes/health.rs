//! Root-level `/health`, outside `/api/v1`.
//!
//! Reports `degraded` when the database is unreachable or the result cache
//! has no room for another task, since `POST /api/v1/tasks` fails in
//! either case.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use blendopt_orchestrator::CacheUsage;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub result_cache: CacheHealth,
}

/// In-memory result cache occupancy.
#[derive(Serialize)]
pub struct CacheHealth {
    /// Tasks whose results are held in memory awaiting finalize.
    pub open_entries: usize,
    pub capacity: usize,
    pub accepting_tasks: bool,
}

impl From<CacheUsage> for CacheHealth {
    fn from(usage: CacheUsage) -> Self {
        Self {
            open_entries: usage.open_entries,
            capacity: usage.capacity,
            accepting_tasks: usage.accepting_tasks(),
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = blendopt_db::health_check(&state.pool).await.is_ok();
    let result_cache = CacheHealth::from(state.orchestrator.cache_usage().await);

    let status = if db_healthy && result_cache.accepting_tasks {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        result_cache,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
