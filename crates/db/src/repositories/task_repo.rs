//! Repository for the `optimization_tasks` table.
//!
//! Uses `TaskStatus` from `models::status` for every status literal.
//! Terminal transitions are guarded in SQL so a task never leaves a
//! terminal state, even under concurrent requests.

use blendopt_core::types::DbId;
use sqlx::PgPool;

use crate::models::status::{TaskStatus, ACTIVE_TASK_STATUSES};
use crate::models::task::{CreateTask, OptimizationTask};

/// Column list for `optimization_tasks` queries.
const COLUMNS: &str = "\
    id, correlation_id, module, status_id, progress, total, \
    parameters, owner_id, error_message, \
    created_at, updated_at, finished_at";

/// Maximum page size for task listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for task listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides query operations for optimization tasks.
pub struct TaskRepo;

impl TaskRepo {
    // ── Queries ──────────────────────────────────────────────────────

    /// Insert a new pending task, returning the row.
    pub async fn create(pool: &PgPool, input: &CreateTask) -> Result<OptimizationTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO optimization_tasks (module, status_id, owner_id, parameters) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OptimizationTask>(&query)
            .bind(&input.module)
            .bind(TaskStatus::Pending.id())
            .bind(input.owner_id)
            .bind(&input.parameters)
            .fetch_one(pool)
            .await
    }

    /// Find a task by the compute service's correlation id.
    pub async fn find_by_correlation_id(
        pool: &PgPool,
        correlation_id: &str,
    ) -> Result<Option<OptimizationTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM optimization_tasks WHERE correlation_id = $1");
        sqlx::query_as::<_, OptimizationTask>(&query)
            .bind(correlation_id)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's tasks, newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<OptimizationTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM optimization_tasks \
             WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, OptimizationTask>(&query)
            .bind(owner_id)
            .bind(limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT))
            .bind(offset.unwrap_or(0).max(0))
            .fetch_all(pool)
            .await
    }

    // ── Status transitions ───────────────────────────────────────────

    /// Record the correlation id and move `pending -> running`.
    ///
    /// Returns `None` if the task was no longer pending.
    pub async fn mark_running(
        pool: &PgPool,
        id: DbId,
        correlation_id: &str,
    ) -> Result<Option<OptimizationTask>, sqlx::Error> {
        let query = format!(
            "UPDATE optimization_tasks \
             SET correlation_id = $2, status_id = $3, error_message = NULL \
             WHERE id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OptimizationTask>(&query)
            .bind(id)
            .bind(correlation_id)
            .bind(TaskStatus::Running.id())
            .bind(TaskStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Store why a start attempt failed. The task stays pending.
    pub async fn record_start_failure(
        pool: &PgPool,
        id: DbId,
        error_message: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE optimization_tasks SET error_message = $2 WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(error_message)
        .bind(TaskStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Update the progress counters of a running task.
    pub async fn update_progress(
        pool: &PgPool,
        id: DbId,
        progress: i32,
        total: Option<i32>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE optimization_tasks \
             SET progress = $2, total = COALESCE($3, total) \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(progress)
        .bind(total)
        .bind(TaskStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Move an active task into a terminal status and stamp `finished_at`.
    ///
    /// Returns `None` when the task was already terminal (or missing), in
    /// which case nothing is written.
    pub async fn finish(
        pool: &PgPool,
        id: DbId,
        status: TaskStatus,
        error_message: Option<&str>,
    ) -> Result<Option<OptimizationTask>, sqlx::Error> {
        debug_assert!(status.is_terminal(), "finish() requires a terminal status");
        let query = format!(
            "UPDATE optimization_tasks \
             SET status_id = $2, error_message = COALESCE($3, error_message), \
                 finished_at = NOW() \
             WHERE id = $1 AND status_id = ANY($4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OptimizationTask>(&query)
            .bind(id)
            .bind(status.id())
            .bind(error_message)
            .bind(&ACTIVE_TASK_STATUSES[..])
            .fetch_optional(pool)
            .await
    }
}
