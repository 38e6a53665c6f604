//! Storage seams used by the orchestrator.
//!
//! Each trait mirrors the repository methods the engine needs. [`PgStore`]
//! implements all of them over a PostgreSQL pool by delegating to the
//! `blendopt_db` repositories; tests substitute in-memory versions.

use std::sync::Arc;

use async_trait::async_trait;
use blendopt_core::modules::ReferenceKind;
use blendopt_core::types::DbId;
use blendopt_db::models::config::OptimizationConfig;
use blendopt_db::models::reference::ReferenceRecord;
use blendopt_db::models::status::TaskStatus;
use blendopt_db::models::task::{CreateTask, OptimizationTask};
use blendopt_db::models::task_result::OptimizationResult;
use blendopt_db::repositories::{ConfigRepo, ReferenceRepo, TaskRepo, TaskResultRepo};
use blendopt_db::DbPool;

/// Durable task registry.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, input: &CreateTask) -> Result<OptimizationTask, sqlx::Error>;

    async fn find_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<OptimizationTask>, sqlx::Error>;

    async fn list_by_owner(
        &self,
        owner_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<OptimizationTask>, sqlx::Error>;

    /// `pending -> running`; `None` if the task was no longer pending.
    async fn mark_running(
        &self,
        id: DbId,
        correlation_id: &str,
    ) -> Result<Option<OptimizationTask>, sqlx::Error>;

    async fn record_start_failure(&self, id: DbId, error_message: &str)
        -> Result<(), sqlx::Error>;

    async fn update_progress(
        &self,
        id: DbId,
        progress: i32,
        total: Option<i32>,
    ) -> Result<(), sqlx::Error>;

    /// Active -> terminal; `None` if the task was already terminal.
    async fn finish(
        &self,
        id: DbId,
        status: TaskStatus,
        error_message: Option<&str>,
    ) -> Result<Option<OptimizationTask>, sqlx::Error>;
}

/// Durable store of final result sets, at most one per task.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert unless a row exists; `true` when this call wrote it.
    async fn insert_once(
        &self,
        task_id: DbId,
        results: &[serde_json::Value],
    ) -> Result<bool, sqlx::Error>;

    async fn find_by_task_id(
        &self,
        task_id: DbId,
    ) -> Result<Option<OptimizationResult>, sqlx::Error>;

    async fn exists(&self, task_id: DbId) -> Result<bool, sqlx::Error>;
}

/// Batch lookups against the reference-data collaborator.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    async fn find_by_ids(
        &self,
        kind: ReferenceKind,
        ids: &[DbId],
    ) -> Result<Vec<ReferenceRecord>, sqlx::Error>;

    async fn find_by_name_tokens(
        &self,
        kind: ReferenceKind,
        tokens: &[String],
    ) -> Result<Vec<ReferenceRecord>, sqlx::Error>;
}

/// Stored module configurations.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// The owner's configuration, else the module's default template.
    async fn find_effective(
        &self,
        owner_id: DbId,
        module: &str,
    ) -> Result<Option<OptimizationConfig>, sqlx::Error>;
}

/// The full set of storage collaborators.
#[derive(Clone)]
pub struct Stores {
    pub tasks: Arc<dyn TaskStore>,
    pub results: Arc<dyn ResultStore>,
    pub references: Arc<dyn ReferenceLookup>,
    pub configs: Arc<dyn ConfigSource>,
}

impl Stores {
    /// Back every store with the same PostgreSQL pool.
    pub fn postgres(pool: DbPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            tasks: store.clone(),
            results: store.clone(),
            references: store.clone(),
            configs: store,
        }
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL implementation
// ---------------------------------------------------------------------------

/// All storage traits over one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create(&self, input: &CreateTask) -> Result<OptimizationTask, sqlx::Error> {
        TaskRepo::create(&self.pool, input).await
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<OptimizationTask>, sqlx::Error> {
        TaskRepo::find_by_correlation_id(&self.pool, correlation_id).await
    }

    async fn list_by_owner(
        &self,
        owner_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<OptimizationTask>, sqlx::Error> {
        TaskRepo::list_by_owner(&self.pool, owner_id, limit, offset).await
    }

    async fn mark_running(
        &self,
        id: DbId,
        correlation_id: &str,
    ) -> Result<Option<OptimizationTask>, sqlx::Error> {
        TaskRepo::mark_running(&self.pool, id, correlation_id).await
    }

    async fn record_start_failure(
        &self,
        id: DbId,
        error_message: &str,
    ) -> Result<(), sqlx::Error> {
        TaskRepo::record_start_failure(&self.pool, id, error_message).await
    }

    async fn update_progress(
        &self,
        id: DbId,
        progress: i32,
        total: Option<i32>,
    ) -> Result<(), sqlx::Error> {
        TaskRepo::update_progress(&self.pool, id, progress, total).await
    }

    async fn finish(
        &self,
        id: DbId,
        status: TaskStatus,
        error_message: Option<&str>,
    ) -> Result<Option<OptimizationTask>, sqlx::Error> {
        TaskRepo::finish(&self.pool, id, status, error_message).await
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn insert_once(
        &self,
        task_id: DbId,
        results: &[serde_json::Value],
    ) -> Result<bool, sqlx::Error> {
        TaskResultRepo::insert_once(&self.pool, task_id, results).await
    }

    async fn find_by_task_id(
        &self,
        task_id: DbId,
    ) -> Result<Option<OptimizationResult>, sqlx::Error> {
        TaskResultRepo::find_by_task_id(&self.pool, task_id).await
    }

    async fn exists(&self, task_id: DbId) -> Result<bool, sqlx::Error> {
        TaskResultRepo::exists(&self.pool, task_id).await
    }
}

#[async_trait]
impl ReferenceLookup for PgStore {
    async fn find_by_ids(
        &self,
        kind: ReferenceKind,
        ids: &[DbId],
    ) -> Result<Vec<ReferenceRecord>, sqlx::Error> {
        ReferenceRepo::find_by_ids(&self.pool, kind, ids).await
    }

    async fn find_by_name_tokens(
        &self,
        kind: ReferenceKind,
        tokens: &[String],
    ) -> Result<Vec<ReferenceRecord>, sqlx::Error> {
        ReferenceRepo::find_by_name_tokens(&self.pool, kind, tokens).await
    }
}

#[async_trait]
impl ConfigSource for PgStore {
    async fn find_effective(
        &self,
        owner_id: DbId,
        module: &str,
    ) -> Result<Option<OptimizationConfig>, sqlx::Error> {
        ConfigRepo::find_effective(&self.pool, owner_id, module).await
    }
}
