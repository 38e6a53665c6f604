//! In-memory collaborators for orchestration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blendopt_compute::{ComputeError, JobProgress, RemoteJobClient, RemoteStatus};
use blendopt_core::modules::{Endpoints, OptimizationModule, ReferenceKind};
use blendopt_core::types::DbId;
use blendopt_db::models::config::OptimizationConfig;
use blendopt_db::models::reference::ReferenceRecord;
use blendopt_db::models::status::TaskStatus;
use blendopt_db::models::task::{CreateTask, OptimizationTask};
use blendopt_db::models::task_result::OptimizationResult;
use blendopt_orchestrator::cache::InMemoryResultCache;
use blendopt_orchestrator::store::{ConfigSource, ReferenceLookup, ResultStore, Stores, TaskStore};
use blendopt_orchestrator::TaskOrchestrator;
use chrono::Utc;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    next_id: DbId,
    tasks: Vec<OptimizationTask>,
    results: Vec<OptimizationResult>,
    references: Vec<ReferenceRecord>,
    configs: Vec<OptimizationConfig>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// Every store trait over one mutex-guarded state.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    /// Number of upcoming result inserts that fail.
    pub failing_inserts: AtomicUsize,
    pub id_lookups: AtomicUsize,
    pub name_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn seed_reference(&self, kind: ReferenceKind, name: &str, composition: Value) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.references.push(ReferenceRecord {
            id,
            kind: kind.as_str().to_string(),
            name: name.to_string(),
            composition,
            unit_price: Some(100.0),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        id
    }

    pub fn seed_config(&self, owner_id: Option<DbId>, module: OptimizationModule, selected_ids: Vec<DbId>) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.configs.push(OptimizationConfig {
            id,
            owner_id,
            module: module.as_str().to_string(),
            selected_ids,
            bounds: json!({}),
            settings: json!({"limits": {"TFe": {"min": 55.0}}}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    pub fn task_count(&self) -> usize {
        self.state.lock().unwrap().tasks.len()
    }

    pub fn task(&self, correlation_id: &str) -> Option<OptimizationTask> {
        self.state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.correlation_id.as_deref() == Some(correlation_id))
            .cloned()
    }

    pub fn latest_task(&self) -> Option<OptimizationTask> {
        self.state.lock().unwrap().tasks.last().cloned()
    }

    pub fn persisted(&self, task_id: DbId) -> Vec<OptimizationResult> {
        self.state
            .lock()
            .unwrap()
            .results
            .iter()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create(&self, input: &CreateTask) -> Result<OptimizationTask, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let now = Utc::now();
        let task = OptimizationTask {
            id,
            correlation_id: None,
            module: input.module.clone(),
            status_id: TaskStatus::Pending.id(),
            progress: 0,
            total: None,
            parameters: input.parameters.clone(),
            owner_id: input.owner_id,
            error_message: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<OptimizationTask>, sqlx::Error> {
        Ok(self.task(correlation_id))
    }

    async fn list_by_owner(
        &self,
        owner_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<OptimizationTask>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tasks
            .iter()
            .rev()
            .filter(|t| t.owner_id == owner_id)
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.unwrap_or(50) as usize)
            .cloned()
            .collect())
    }

    async fn mark_running(
        &self,
        id: DbId,
        correlation_id: &str,
    ) -> Result<Option<OptimizationTask>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let Some(task) = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.status() == TaskStatus::Pending)
        else {
            return Ok(None);
        };
        task.correlation_id = Some(correlation_id.to_string());
        task.status_id = TaskStatus::Running.id();
        task.error_message = None;
        Ok(Some(task.clone()))
    }

    async fn record_start_failure(&self, id: DbId, error_message: &str) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(task) = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.status() == TaskStatus::Pending)
        {
            task.error_message = Some(error_message.to_string());
        }
        Ok(())
    }

    async fn update_progress(
        &self,
        id: DbId,
        progress: i32,
        total: Option<i32>,
    ) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(task) = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.status() == TaskStatus::Running)
        {
            task.progress = progress;
            task.total = total.or(task.total);
        }
        Ok(())
    }

    async fn finish(
        &self,
        id: DbId,
        status: TaskStatus,
        error_message: Option<&str>,
    ) -> Result<Option<OptimizationTask>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let Some(task) = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id && !t.status().is_terminal())
        else {
            return Ok(None);
        };
        task.status_id = status.id();
        if let Some(message) = error_message {
            task.error_message = Some(message.to_string());
        }
        task.finished_at = Some(Utc::now());
        Ok(Some(task.clone()))
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn insert_once(&self, task_id: DbId, results: &[Value]) -> Result<bool, sqlx::Error> {
        let failing = self.failing_inserts.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_inserts.store(failing - 1, Ordering::SeqCst);
            return Err(sqlx::Error::PoolTimedOut);
        }

        let mut state = self.state.lock().unwrap();
        if state.results.iter().any(|r| r.task_id == task_id) {
            return Ok(false);
        }
        let id = state.next_id();
        let now = Utc::now();
        state.results.push(OptimizationResult {
            id,
            task_id,
            results: Value::Array(results.to_vec()),
            result_count: results.len() as i32,
            completed_at: now,
            created_at: now,
            updated_at: now,
        });
        Ok(true)
    }

    async fn find_by_task_id(&self, task_id: DbId) -> Result<Option<OptimizationResult>, sqlx::Error> {
        Ok(self.persisted(task_id).into_iter().next())
    }

    async fn exists(&self, task_id: DbId) -> Result<bool, sqlx::Error> {
        Ok(!self.persisted(task_id).is_empty())
    }
}

#[async_trait]
impl ReferenceLookup for MemoryStore {
    async fn find_by_ids(
        &self,
        kind: ReferenceKind,
        ids: &[DbId],
    ) -> Result<Vec<ReferenceRecord>, sqlx::Error> {
        self.id_lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .references
            .iter()
            .filter(|r| r.kind == kind.as_str() && ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn find_by_name_tokens(
        &self,
        kind: ReferenceKind,
        tokens: &[String],
    ) -> Result<Vec<ReferenceRecord>, sqlx::Error> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .references
            .iter()
            .filter(|r| {
                r.kind == kind.as_str()
                    && tokens
                        .iter()
                        .any(|t| r.name.to_lowercase().contains(&t.to_lowercase()))
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConfigSource for MemoryStore {
    async fn find_effective(
        &self,
        owner_id: DbId,
        module: &str,
    ) -> Result<Option<OptimizationConfig>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let own = state
            .configs
            .iter()
            .find(|c| c.module == module && c.owner_id == Some(owner_id));
        let template = state
            .configs
            .iter()
            .find(|c| c.module == module && c.owner_id.is_none());
        Ok(own.or(template).cloned())
    }
}

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

/// Remote client replaying scripted responses.
///
/// Starts hand out `job-1`, `job-2`, ... unless a failure is queued. Polls
/// pop from the script; an empty script answers "running, nothing new".
#[derive(Default)]
pub struct ScriptedRemote {
    start_failures: Mutex<VecDeque<ComputeError>>,
    polls: Mutex<VecDeque<Result<JobProgress, ComputeError>>>,
    pub fail_stop: AtomicBool,
    pub start_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub last_payload: Mutex<Option<Value>>,
}

impl ScriptedRemote {
    pub fn fail_next_start(&self, err: ComputeError) {
        self.start_failures.lock().unwrap().push_back(err);
    }

    pub fn push_poll(&self, response: Result<JobProgress, ComputeError>) {
        self.polls.lock().unwrap().push_back(response);
    }

    pub fn polls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteJobClient for ScriptedRemote {
    async fn start(&self, _endpoints: &Endpoints, payload: &Value) -> Result<String, ComputeError> {
        let n = self.start_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_payload.lock().unwrap() = Some(payload.clone());
        if let Some(err) = self.start_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(format!("job-{n}"))
    }

    async fn poll(&self, _endpoints: &Endpoints, _correlation_id: &str) -> Result<JobProgress, ComputeError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(running(0, None, vec![])))
    }

    async fn stop(&self, _endpoints: &Endpoints, _correlation_id: &str) -> Result<(), ComputeError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(api_error(503));
        }
        Ok(())
    }
}

pub fn running(progress: i64, total: Option<i64>, results: Vec<Value>) -> JobProgress {
    JobProgress {
        status: RemoteStatus::Running,
        progress,
        total,
        results,
        error: None,
    }
}

pub fn finished(progress: i64, total: Option<i64>, results: Vec<Value>) -> JobProgress {
    JobProgress {
        status: RemoteStatus::Finished,
        ..running(progress, total, results)
    }
}

pub fn failed(error: &str, results: Vec<Value>) -> JobProgress {
    JobProgress {
        status: RemoteStatus::Failed,
        error: Some(error.to_string()),
        ..running(0, None, results)
    }
}

pub fn api_error(status: u16) -> ComputeError {
    ComputeError::ApiError {
        status,
        body: "unavailable".to_string(),
    }
}

/// `n` records tagged with `start..start + n`.
pub fn records(start: i64, n: i64) -> Vec<Value> {
    (start..start + n).map(|i| json!({"seq": i, "cost": 100 - i})).collect()
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub const OWNER: DbId = 42;

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub remote: Arc<ScriptedRemote>,
    pub cache: Arc<InMemoryResultCache>,
    pub orchestrator: TaskOrchestrator,
}

pub fn harness() -> Harness {
    harness_with_capacity(16)
}

pub fn harness_with_capacity(max_entries: usize) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let remote = Arc::new(ScriptedRemote::default());
    let cache = Arc::new(InMemoryResultCache::new(max_entries));
    let stores = Stores {
        tasks: store.clone(),
        results: store.clone(),
        references: store.clone(),
        configs: store.clone(),
    };
    let orchestrator = TaskOrchestrator::new(stores, remote.clone(), cache.clone());
    Harness {
        store,
        remote,
        cache,
        orchestrator,
    }
}

impl Harness {
    /// Seed two ores and a default sinter-blend template.
    pub fn seed_sinter_blend(&self) -> (DbId, DbId) {
        let a = self
            .store
            .seed_reference(ReferenceKind::Material, "Hematite fines", json!({"TFe": 62.5}));
        let b = self
            .store
            .seed_reference(ReferenceKind::Material, "Magnetite concentrate", json!({"TFe": 66.0}));
        self.store
            .seed_config(None, OptimizationModule::SinterBlend, vec![a, b]);
        (a, b)
    }

    /// Seed and start a sinter-blend task, returning its correlation id.
    pub async fn start_sinter_blend(&self) -> String {
        self.seed_sinter_blend();
        self.orchestrator
            .start_task(OptimizationModule::SinterBlend, OWNER)
            .await
            .unwrap()
            .correlation_id
    }
}
