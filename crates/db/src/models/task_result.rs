//! Persisted optimization results.

use blendopt_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `optimization_results` table. At most one per task.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OptimizationResult {
    pub id: DbId,
    pub task_id: DbId,
    /// JSON array: every batch received for the task, in receipt order.
    pub results: serde_json::Value,
    pub result_count: i32,
    pub completed_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OptimizationResult {
    /// Consume the row and return its records.
    pub fn into_records(self) -> Vec<serde_json::Value> {
        match self.results {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Null => Vec::new(),
            other => vec![other],
        }
    }
}
