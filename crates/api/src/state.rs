use std::sync::Arc;

use blendopt_compute::RemoteJobClient;
use blendopt_orchestrator::cache::InMemoryResultCache;
use blendopt_orchestrator::store::Stores;
use blendopt_orchestrator::TaskOrchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: blendopt_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Task orchestration engine, owning the result cache.
    pub orchestrator: Arc<TaskOrchestrator>,
}

impl AppState {
    /// Wire the orchestrator over `pool` with the given compute client and
    /// a fresh in-memory result cache.
    pub fn new(
        pool: blendopt_db::DbPool,
        config: ServerConfig,
        remote: Arc<dyn RemoteJobClient>,
    ) -> Self {
        let cache = Arc::new(InMemoryResultCache::new(config.result_cache_max_entries));
        let orchestrator = TaskOrchestrator::new(Stores::postgres(pool.clone()), remote, cache);

        Self {
            pool,
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
        }
    }
}
