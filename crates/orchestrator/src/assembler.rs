//! Builds the remote start payload from stored configuration.

use std::sync::Arc;

use blendopt_core::assembly::{assemble_payload, ConfigInput, ReferenceInput};
use blendopt_core::modules::ModuleAdapter;
use blendopt_core::types::DbId;
use serde_json::Value;

use crate::error::OrchestratorError;
use crate::store::{ConfigSource, ReferenceLookup};

/// Reads the effective configuration for an owner and module, fetches the
/// selected reference records in one batch, and shapes the payload.
pub struct ParameterAssembler {
    configs: Arc<dyn ConfigSource>,
    references: Arc<dyn ReferenceLookup>,
}

impl ParameterAssembler {
    pub fn new(configs: Arc<dyn ConfigSource>, references: Arc<dyn ReferenceLookup>) -> Self {
        Self {
            configs,
            references,
        }
    }

    pub async fn assemble(
        &self,
        adapter: &ModuleAdapter,
        owner_id: DbId,
    ) -> Result<Value, OrchestratorError> {
        let module = adapter.module.as_str();
        let config = self
            .configs
            .find_effective(owner_id, module)
            .await?
            .ok_or_else(|| OrchestratorError::ConfigurationMissing {
                module: module.to_string(),
                owner_id,
            })?;

        let records = self
            .references
            .find_by_ids(adapter.reference_kind, &config.selected_ids)
            .await?;
        let inputs: Vec<ReferenceInput> = records.into_iter().map(Into::into).collect();

        let assembled = assemble_payload(
            adapter,
            owner_id,
            ConfigInput {
                selected_ids: &config.selected_ids,
                bounds: &config.bounds,
                settings: &config.settings,
            },
            &inputs,
        )?;

        if !assembled.missing_ids.is_empty() {
            tracing::warn!(
                module,
                owner_id,
                missing = ?assembled.missing_ids,
                "Selected reference records not found; omitted from payload",
            );
        }
        tracing::debug!(
            module,
            owner_id,
            template = config.is_template(),
            blocks = inputs.len(),
            "Assembled start payload",
        );

        Ok(assembled.payload)
    }
}
