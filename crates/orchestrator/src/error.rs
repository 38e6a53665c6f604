use blendopt_compute::ComputeError;
use blendopt_core::error::CoreError;
use blendopt_core::types::DbId;

use crate::cache::CacheError;

/// Errors surfaced by orchestration operations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// No task carries this correlation id.
    #[error("No task with correlation id {0}")]
    NotFound(String),

    /// Neither the owner nor the module default template has a usable
    /// configuration.
    #[error("No configuration for module '{module}' (owner {owner_id}) and no default template")]
    ConfigurationMissing { module: String, owner_id: DbId },

    /// The compute service did not accept the job.
    #[error("Failed to start remote job: {0}")]
    RemoteStart(#[source] ComputeError),

    /// A poll failed in a way worth retrying.
    #[error("Failed to poll remote job: {0}")]
    RemotePoll(#[source] ComputeError),

    /// Writing the final result set failed; the cache entry is kept.
    #[error("Failed to persist results: {0}")]
    Persistence(#[source] sqlx::Error),

    /// The result cache has no room for another running task.
    #[error("Result cache is full ({capacity} running tasks)")]
    CacheFull { capacity: usize },

    #[error(transparent)]
    Core(CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for OrchestratorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConfigurationMissing { module, owner_id } => {
                Self::ConfigurationMissing { module, owner_id }
            }
            other => Self::Core(other),
        }
    }
}

impl From<CacheError> for OrchestratorError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Full { capacity } => Self::CacheFull { capacity },
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Convenience alias for orchestration results.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
