//! Read queries over `optimization_configs`.

use blendopt_core::types::DbId;
use sqlx::PgPool;

use crate::models::config::OptimizationConfig;

/// Column list for `optimization_configs` queries.
const COLUMNS: &str = "\
    id, owner_id, module, selected_ids, bounds, settings, created_at, updated_at";

pub struct ConfigRepo;

impl ConfigRepo {
    /// The configuration that applies to `owner_id` for `module`: the
    /// owner's own row if present, otherwise the module's default template.
    pub async fn find_effective(
        pool: &PgPool,
        owner_id: DbId,
        module: &str,
    ) -> Result<Option<OptimizationConfig>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM optimization_configs \
             WHERE module = $1 AND (owner_id = $2 OR owner_id IS NULL) \
             ORDER BY owner_id NULLS LAST \
             LIMIT 1"
        );
        sqlx::query_as::<_, OptimizationConfig>(&query)
            .bind(module)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }
}
