//! Persists a terminal task's accumulated results exactly once.

use std::sync::Arc;

use blendopt_db::models::task::OptimizationTask;

use crate::cache::ResultCache;
use crate::error::OrchestratorError;
use crate::store::ResultStore;

/// What a finalize call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// This call wrote the result set.
    Persisted { count: usize },
    /// A result set already existed; nothing was written.
    AlreadyPersisted,
}

/// Moves the cache entry of a terminal task into durable storage.
///
/// The cache entry is evicted only after the write succeeds, so a failed
/// write can be retried from the same records.
pub struct Finalizer {
    results: Arc<dyn ResultStore>,
    cache: Arc<dyn ResultCache>,
}

impl Finalizer {
    pub fn new(results: Arc<dyn ResultStore>, cache: Arc<dyn ResultCache>) -> Self {
        Self { results, cache }
    }

    pub async fn finalize(
        &self,
        task: &OptimizationTask,
    ) -> Result<FinalizeOutcome, OrchestratorError> {
        let correlation_id = task.correlation_id.as_deref();

        if self
            .results
            .exists(task.id)
            .await
            .map_err(OrchestratorError::Persistence)?
        {
            if let Some(cid) = correlation_id {
                self.cache.evict(cid).await;
            }
            return Ok(FinalizeOutcome::AlreadyPersisted);
        }

        let records = match correlation_id {
            Some(cid) => self.cache.snapshot(cid).await,
            None => None,
        };
        let records = records.unwrap_or_else(|| {
            tracing::warn!(
                task_id = task.id,
                correlation_id = ?correlation_id,
                "No cached results for terminal task; persisting an empty set",
            );
            Vec::new()
        });

        let inserted = self
            .results
            .insert_once(task.id, &records)
            .await
            .map_err(OrchestratorError::Persistence)?;

        if let Some(cid) = correlation_id {
            self.cache.evict(cid).await;
        }

        if inserted {
            tracing::info!(
                task_id = task.id,
                correlation_id = ?correlation_id,
                count = records.len(),
                "Results persisted",
            );
            Ok(FinalizeOutcome::Persisted {
                count: records.len(),
            })
        } else {
            Ok(FinalizeOutcome::AlreadyPersisted)
        }
    }
}
