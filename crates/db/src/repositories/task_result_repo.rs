//! Repository for the `optimization_results` table.

use blendopt_core::types::DbId;
use sqlx::PgPool;

use crate::models::task_result::OptimizationResult;

/// Column list for `optimization_results` queries.
const COLUMNS: &str = "id, task_id, results, result_count, completed_at, created_at, updated_at";

/// Provides query operations for persisted task results.
pub struct TaskResultRepo;

impl TaskResultRepo {
    /// Write the full result set for a task unless one already exists.
    ///
    /// Returns `true` if this call inserted the row, `false` if a row was
    /// already present (the existing row is left untouched).
    pub async fn insert_once(
        pool: &PgPool,
        task_id: DbId,
        results: &[serde_json::Value],
    ) -> Result<bool, sqlx::Error> {
        let count = i32::try_from(results.len()).unwrap_or(i32::MAX);
        let result = sqlx::query(
            "INSERT INTO optimization_results (task_id, results, result_count, completed_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (task_id) DO NOTHING",
        )
        .bind(task_id)
        .bind(sqlx::types::Json(results))
        .bind(count)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_task_id(
        pool: &PgPool,
        task_id: DbId,
    ) -> Result<Option<OptimizationResult>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM optimization_results WHERE task_id = $1");
        sqlx::query_as::<_, OptimizationResult>(&query)
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, task_id: DbId) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM optimization_results WHERE task_id = $1)")
                .bind(task_id)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }
}
