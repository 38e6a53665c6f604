//! Per-task accumulation of partial results.
//!
//! One entry exists per running task, keyed by correlation id. Batches are
//! appended in poll order and the entry is evicted once the final result
//! set has been persisted.

use std::collections::HashMap;

use async_trait::async_trait;
use blendopt_core::types::Timestamp;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

/// Errors from result cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Result cache is full ({capacity} entries)")]
    Full { capacity: usize },

    #[error("No cache entry for correlation id {0}")]
    Missing(String),
}

/// Keyed, append-only accumulation of result batches.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Create an empty entry. Opening an existing entry keeps its records.
    async fn open(&self, correlation_id: &str) -> Result<(), CacheError>;

    /// Append a batch in order and return the new record count.
    async fn append(&self, correlation_id: &str, batch: Vec<Value>) -> Result<usize, CacheError>;

    /// Copy of the accumulated records, `None` without an entry.
    async fn snapshot(&self, correlation_id: &str) -> Option<Vec<Value>>;

    async fn contains(&self, correlation_id: &str) -> bool;

    /// Drop the entry; `true` if one existed.
    async fn evict(&self, correlation_id: &str) -> bool;

    /// Whether another entry can be opened.
    async fn has_capacity(&self) -> bool;

    /// Maximum number of open entries.
    fn capacity(&self) -> usize;

    async fn len(&self) -> usize;

    /// When the entry last received a non-empty batch (or was opened).
    async fn last_updated(&self, correlation_id: &str) -> Option<Timestamp>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<Value>,
    last_updated: Timestamp,
}

impl CacheEntry {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

/// Process-local [`ResultCache`] bounded by entry count.
pub struct InMemoryResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl InMemoryResultCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }
}

#[async_trait]
impl ResultCache for InMemoryResultCache {
    async fn open(&self, correlation_id: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(correlation_id) {
            return Ok(());
        }
        if entries.len() >= self.max_entries {
            return Err(CacheError::Full {
                capacity: self.max_entries,
            });
        }
        entries.insert(correlation_id.to_string(), CacheEntry::new());
        Ok(())
    }

    async fn append(&self, correlation_id: &str, batch: Vec<Value>) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(correlation_id)
            .ok_or_else(|| CacheError::Missing(correlation_id.to_string()))?;
        if !batch.is_empty() {
            entry.records.extend(batch);
            entry.last_updated = Utc::now();
        }
        Ok(entry.records.len())
    }

    async fn snapshot(&self, correlation_id: &str) -> Option<Vec<Value>> {
        self.entries
            .read()
            .await
            .get(correlation_id)
            .map(|e| e.records.clone())
    }

    async fn contains(&self, correlation_id: &str) -> bool {
        self.entries.read().await.contains_key(correlation_id)
    }

    async fn evict(&self, correlation_id: &str) -> bool {
        self.entries.write().await.remove(correlation_id).is_some()
    }

    async fn has_capacity(&self) -> bool {
        self.entries.read().await.len() < self.max_entries
    }

    fn capacity(&self) -> usize {
        self.max_entries
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn last_updated(&self, correlation_id: &str) -> Option<Timestamp> {
        self.entries
            .read()
            .await
            .get(correlation_id)
            .map(|e| e.last_updated)
    }
}
