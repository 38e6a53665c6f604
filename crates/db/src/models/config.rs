//! Stored optimization configurations.

use blendopt_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `optimization_configs` table.
///
/// Rows with `owner_id = NULL` are the per-module default templates.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OptimizationConfig {
    pub id: DbId,
    pub owner_id: Option<DbId>,
    pub module: String,
    pub selected_ids: Vec<DbId>,
    pub bounds: serde_json::Value,
    pub settings: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OptimizationConfig {
    pub fn is_template(&self) -> bool {
        self.owner_id.is_none()
    }
}
