//! Reference records (materials, fuels, coals, cokes).
//!
//! Maintained by the reference-data tooling; this service only reads them.

use blendopt_core::assembly::ReferenceInput;
use blendopt_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `reference_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReferenceRecord {
    pub id: DbId,
    pub kind: String,
    pub name: String,
    pub composition: serde_json::Value,
    pub unit_price: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ReferenceRecord> for ReferenceInput {
    fn from(record: ReferenceRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            composition: record.composition,
            unit_price: record.unit_price,
        }
    }
}
