use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No configuration for module '{module}' (owner {owner_id}) and no default template")]
    ConfigurationMissing { module: String, owner_id: DbId },
}
