//! Read-only queries over `reference_records`.

use blendopt_core::modules::ReferenceKind;
use blendopt_core::types::DbId;
use sqlx::PgPool;

use crate::models::reference::ReferenceRecord;

/// Column list for `reference_records` queries.
const COLUMNS: &str = "id, kind, name, composition, unit_price, created_at, updated_at";

/// Batch lookups used by payload assembly and identifier resolution.
pub struct ReferenceRepo;

impl ReferenceRepo {
    /// Fetch every record of `kind` whose id is in `ids`, in one query.
    pub async fn find_by_ids(
        pool: &PgPool,
        kind: ReferenceKind,
        ids: &[DbId],
    ) -> Result<Vec<ReferenceRecord>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM reference_records \
             WHERE kind = $1 AND id = ANY($2) \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, ReferenceRecord>(&query)
            .bind(kind.as_str())
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Fetch every record of `kind` whose name contains any of `tokens`
    /// (case-insensitive), in one query.
    pub async fn find_by_name_tokens(
        pool: &PgPool,
        kind: ReferenceKind,
        tokens: &[String],
    ) -> Result<Vec<ReferenceRecord>, sqlx::Error> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let patterns: Vec<String> = tokens
            .iter()
            .map(|t| format!("%{}%", escape_like(t)))
            .collect();
        let query = format!(
            "SELECT {COLUMNS} FROM reference_records \
             WHERE kind = $1 AND name ILIKE ANY($2) \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, ReferenceRecord>(&query)
            .bind(kind.as_str())
            .bind(&patterns)
            .fetch_all(pool)
            .await
    }
}

/// Escape `LIKE` wildcards so tokens match literally.
fn escape_like(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
