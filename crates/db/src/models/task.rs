//! Optimization task entity and DTOs.

use blendopt_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::{StatusId, TaskStatus};

/// A row from the `optimization_tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OptimizationTask {
    pub id: DbId,
    /// Assigned by the compute service; `None` while pending.
    pub correlation_id: Option<String>,
    pub module: String,
    pub status_id: StatusId,
    pub progress: i32,
    pub total: Option<i32>,
    /// Snapshot of the payload sent to the compute service.
    pub parameters: serde_json::Value,
    pub owner_id: DbId,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

impl OptimizationTask {
    /// Decode `status_id`. Unknown ids (not in the seed data) read as
    /// `Failed` so they are never polled.
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_id(self.status_id).unwrap_or(TaskStatus::Failed)
    }
}

/// DTO for inserting a new pending task.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub module: String,
    pub owner_id: DbId,
    pub parameters: serde_json::Value,
}
