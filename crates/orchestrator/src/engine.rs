//! The generic orchestration engine.
//!
//! [`TaskOrchestrator`] owns every collaborator by handle and implements
//! the client contract: start, stop, progress, and listing. Progress is
//! client-driven; each `get_progress` call on a running task performs at
//! most one remote poll.
//!
//! Concurrent polls for the same task are not serialized. Two interleaved
//! polls may append their batches in either order.

use std::sync::Arc;

use blendopt_compute::{ComputeError, JobProgress, RemoteJobClient, RemoteStatus};
use blendopt_core::modules::{ModuleAdapter, OptimizationModule};
use blendopt_core::pagination::{build_page, PageRequest};
use blendopt_core::types::{DbId, Timestamp};
use blendopt_db::models::status::TaskStatus;
use blendopt_db::models::task::{CreateTask, OptimizationTask};
use serde::Serialize;
use serde_json::Value;

use crate::assembler::ParameterAssembler;
use crate::cache::ResultCache;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::finalizer::Finalizer;
use crate::resolver::IdentifierResolver;
use crate::store::{ResultStore, Stores, TaskStore};

/// Message stored on a task the remote reported as failed without detail.
const REMOTE_FAILED_MESSAGE: &str = "Remote job reported failure";

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Returned by [`TaskOrchestrator::start_task`].
#[derive(Debug, Clone, Serialize)]
pub struct StartedTask {
    pub task_id: DbId,
    pub correlation_id: String,
    pub module: OptimizationModule,
    pub status: TaskStatus,
}

/// One page of a task's results plus its counters.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub correlation_id: String,
    pub module: String,
    pub status: TaskStatus,
    pub progress: i32,
    pub total: Option<i32>,
    pub page: i64,
    pub page_size: i64,
    pub total_results: usize,
    pub total_pages: usize,
    pub results: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Returned by [`TaskOrchestrator::cache_usage`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheUsage {
    pub open_entries: usize,
    pub capacity: usize,
}

impl CacheUsage {
    pub fn accepting_tasks(&self) -> bool {
        self.open_entries < self.capacity
    }
}

/// Task listing entry without parameters or results.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub task_id: DbId,
    pub correlation_id: Option<String>,
    pub module: String,
    pub status: TaskStatus,
    pub progress: i32,
    pub total: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

impl From<OptimizationTask> for TaskSummary {
    fn from(task: OptimizationTask) -> Self {
        Self {
            status: task.status(),
            task_id: task.id,
            correlation_id: task.correlation_id,
            module: task.module,
            progress: task.progress,
            total: task.total,
            error_message: task.error_message,
            created_at: task.created_at,
            finished_at: task.finished_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct TaskOrchestrator {
    tasks: Arc<dyn TaskStore>,
    results: Arc<dyn ResultStore>,
    remote: Arc<dyn RemoteJobClient>,
    cache: Arc<dyn ResultCache>,
    assembler: ParameterAssembler,
    resolver: IdentifierResolver,
    finalizer: Finalizer,
}

impl TaskOrchestrator {
    pub fn new(
        stores: Stores,
        remote: Arc<dyn RemoteJobClient>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        Self {
            assembler: ParameterAssembler::new(stores.configs, stores.references.clone()),
            resolver: IdentifierResolver::new(stores.references),
            finalizer: Finalizer::new(stores.results.clone(), cache.clone()),
            tasks: stores.tasks,
            results: stores.results,
            remote,
            cache,
        }
    }

    /// Occupancy of the result cache. Every open entry belongs to a task
    /// that has not been finalized yet.
    pub async fn cache_usage(&self) -> CacheUsage {
        CacheUsage {
            open_entries: self.cache.len().await,
            capacity: self.cache.capacity(),
        }
    }

    // ---- start ----

    /// Assemble the payload, start the remote job, and move the task to
    /// `RUNNING` with an empty cache entry.
    ///
    /// A failed remote start leaves the task `PENDING` with the error
    /// recorded; it is never retried automatically.
    pub async fn start_task(
        &self,
        module: OptimizationModule,
        owner_id: DbId,
    ) -> OrchestratorResult<StartedTask> {
        let adapter = module.adapter();
        let payload = self.assembler.assemble(adapter, owner_id).await?;

        if !self.cache.has_capacity().await {
            let capacity = self.cache.capacity();
            tracing::warn!(module = %module, owner_id, capacity, "Result cache full; start refused");
            return Err(OrchestratorError::CacheFull { capacity });
        }

        let task = self
            .tasks
            .create(&CreateTask {
                module: module.as_str().to_string(),
                owner_id,
                parameters: payload.clone(),
            })
            .await?;

        let correlation_id = match self.remote.start(&adapter.endpoints, &payload).await {
            Ok(cid) => cid,
            Err(e) => {
                tracing::warn!(
                    task_id = task.id,
                    module = %module,
                    timeout = e.is_timeout(),
                    error = %e,
                    "Remote start failed; task left pending",
                );
                if let Err(db_err) = self.tasks.record_start_failure(task.id, &e.to_string()).await {
                    tracing::error!(task_id = task.id, error = %db_err, "Failed to record start failure");
                }
                return Err(OrchestratorError::RemoteStart(e));
            }
        };

        let running = match self.tasks.mark_running(task.id, &correlation_id).await {
            Ok(Some(running)) => running,
            Ok(None) => {
                self.abandon_remote(adapter, &correlation_id).await;
                return Err(OrchestratorError::Internal(format!(
                    "task {} left the pending state during start",
                    task.id
                )));
            }
            Err(e) => {
                self.abandon_remote(adapter, &correlation_id).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.cache.open(&correlation_id).await {
            self.abandon_remote(adapter, &correlation_id).await;
            if let Err(db_err) = self
                .tasks
                .finish(running.id, TaskStatus::Failed, Some(&e.to_string()))
                .await
            {
                tracing::error!(task_id = running.id, error = %db_err, "Failed to fail untracked task");
            }
            return Err(e.into());
        }

        tracing::info!(
            task_id = running.id,
            %correlation_id,
            module = %module,
            owner_id,
            "Task started",
        );

        Ok(StartedTask {
            task_id: running.id,
            correlation_id,
            module,
            status: running.status(),
        })
    }

    /// Best-effort stop of a remote job this process could not track.
    async fn abandon_remote(&self, adapter: &ModuleAdapter, correlation_id: &str) {
        if let Err(e) = self.remote.stop(&adapter.endpoints, correlation_id).await {
            tracing::warn!(%correlation_id, error = %e, "Failed to stop untracked remote job");
        }
    }

    // ---- stop ----

    /// Ask the remote to stop, then finalize and mark the task `STOPPED`
    /// whatever the remote answered. Terminal tasks are returned as-is.
    pub async fn stop_task(&self, correlation_id: &str) -> OrchestratorResult<TaskStatus> {
        let task = self.find_task(correlation_id).await?;
        let status = task.status();
        if status.is_terminal() {
            tracing::debug!(%correlation_id, status = status.name(), "Stop on terminal task ignored");
            return Ok(status);
        }

        let adapter = adapter_for(&task)?;
        if let Err(e) = self.remote.stop(&adapter.endpoints, correlation_id).await {
            tracing::warn!(
                task_id = task.id,
                %correlation_id,
                error = %e,
                "Remote stop failed; stopping locally",
            );
        }

        let task = self.terminate(task, TaskStatus::Stopped, None).await?;
        Ok(task.status())
    }

    // ---- progress ----

    /// Advance a running task by one poll and return one sorted,
    /// name-resolved page of its results.
    pub async fn get_progress(
        &self,
        correlation_id: &str,
        request: &PageRequest,
    ) -> OrchestratorResult<ProgressView> {
        let mut task = self.find_task(correlation_id).await?;
        let adapter = adapter_for(&task)?;

        if task.status() == TaskStatus::Running {
            task = self.advance(task, adapter, correlation_id).await?;
        }

        let records = self.current_records(&task, correlation_id).await?;
        let mut page = build_page(&records, request);

        if let Err(e) = self.resolver.resolve(adapter, &mut page.items).await {
            tracing::warn!(%correlation_id, error = %e, "Identifier resolution failed; serving raw ids");
        }

        Ok(ProgressView {
            correlation_id: correlation_id.to_string(),
            status: task.status(),
            module: task.module,
            progress: task.progress,
            total: task.total,
            page: page.page,
            page_size: page.page_size,
            total_results: page.total,
            total_pages: page.total_pages,
            results: page.items,
            error_message: task.error_message,
        })
    }

    /// One remote poll: append the batch, update counters, and finalize on
    /// a terminal observation.
    async fn advance(
        &self,
        mut task: OptimizationTask,
        adapter: &ModuleAdapter,
        correlation_id: &str,
    ) -> OrchestratorResult<OptimizationTask> {
        let progress = match self.remote.poll(&adapter.endpoints, correlation_id).await {
            Ok(progress) => progress,
            Err(e) if e.is_unrecoverable() => {
                tracing::warn!(task_id = task.id, %correlation_id, error = %e, "Remote job lost; failing task");
                return self
                    .terminate(task, TaskStatus::Failed, Some(&e.to_string()))
                    .await;
            }
            Err(e) => return Err(poll_error(correlation_id, e)),
        };

        let JobProgress {
            status,
            progress,
            total,
            results,
            error,
        } = progress;
        let batch_len = results.len();

        if !self.cache.contains(correlation_id).await {
            tracing::warn!(
                task_id = task.id,
                %correlation_id,
                "No cache entry for running task; earlier batches are lost",
            );
            self.cache.open(correlation_id).await?;
        }
        let previous_batch_at = self.cache.last_updated(correlation_id).await;
        let accumulated = self.cache.append(correlation_id, results).await?;

        let (progress, total) = clamp_counters(progress, total.or(task.total.map(i64::from)));
        self.tasks.update_progress(task.id, progress, total).await?;
        task.progress = progress;
        task.total = total;

        tracing::debug!(
            task_id = task.id,
            %correlation_id,
            batch = batch_len,
            accumulated,
            progress,
            total = ?total,
            previous_batch_at = ?previous_batch_at,
            "Poll appended batch",
        );

        match status {
            RemoteStatus::Running => Ok(task),
            RemoteStatus::Finished => self.terminate(task, TaskStatus::Finished, None).await,
            RemoteStatus::Failed => {
                let message = error.unwrap_or_else(|| REMOTE_FAILED_MESSAGE.to_string());
                self.terminate(task, TaskStatus::Failed, Some(&message)).await
            }
        }
    }

    /// Move to a terminal status and finalize. A finalize failure is logged
    /// and retried by a later read.
    async fn terminate(
        &self,
        task: OptimizationTask,
        status: TaskStatus,
        error_message: Option<&str>,
    ) -> OrchestratorResult<OptimizationTask> {
        let task = match self.tasks.finish(task.id, status, error_message).await? {
            Some(finished) => {
                tracing::info!(
                    task_id = finished.id,
                    correlation_id = ?finished.correlation_id,
                    status = status.name(),
                    "Task reached terminal state",
                );
                finished
            }
            // Another request already moved it; reload the winner.
            None => self.reload(task).await?,
        };

        if let Err(e) = self.finalizer.finalize(&task).await {
            tracing::error!(
                task_id = task.id,
                correlation_id = ?task.correlation_id,
                error = %e,
                "Finalize failed; cached results kept for retry",
            );
        }
        Ok(task)
    }

    /// The full record list for a task: persisted if terminal, else cached.
    async fn current_records(
        &self,
        task: &OptimizationTask,
        correlation_id: &str,
    ) -> OrchestratorResult<Vec<Value>> {
        if !task.status().is_terminal() {
            return Ok(self.cache.snapshot(correlation_id).await.unwrap_or_default());
        }

        if let Some(persisted) = self.results.find_by_task_id(task.id).await? {
            return Ok(persisted.into_records());
        }

        // Terminal without a persisted row: an earlier finalize failed.
        let Some(cached) = self.cache.snapshot(correlation_id).await else {
            tracing::warn!(
                task_id = task.id,
                %correlation_id,
                "Terminal task has neither persisted nor cached results",
            );
            return Ok(Vec::new());
        };

        match self.finalizer.finalize(task).await {
            Ok(_) => Ok(self
                .results
                .find_by_task_id(task.id)
                .await?
                .map(|r| r.into_records())
                .unwrap_or(cached)),
            Err(e) => {
                tracing::error!(
                    task_id = task.id,
                    %correlation_id,
                    error = %e,
                    "Finalize retry failed; serving cached results",
                );
                Ok(cached)
            }
        }
    }

    // ---- listing ----

    pub async fn list_tasks(
        &self,
        owner_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> OrchestratorResult<Vec<TaskSummary>> {
        let tasks = self.tasks.list_by_owner(owner_id, limit, offset).await?;
        Ok(tasks.into_iter().map(TaskSummary::from).collect())
    }

    // ---- helpers ----

    async fn find_task(&self, correlation_id: &str) -> OrchestratorResult<OptimizationTask> {
        self.tasks
            .find_by_correlation_id(correlation_id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(correlation_id.to_string()))
    }

    async fn reload(&self, task: OptimizationTask) -> OrchestratorResult<OptimizationTask> {
        match task.correlation_id.as_deref() {
            Some(cid) => self.find_task(cid).await,
            None => Ok(task),
        }
    }
}

fn adapter_for(task: &OptimizationTask) -> OrchestratorResult<&'static ModuleAdapter> {
    task.module
        .parse::<OptimizationModule>()
        .map(OptimizationModule::adapter)
        .map_err(|_| {
            OrchestratorError::Internal(format!(
                "task {} has unknown module '{}'",
                task.id, task.module
            ))
        })
}

fn poll_error(correlation_id: &str, e: ComputeError) -> OrchestratorError {
    tracing::warn!(
        %correlation_id,
        timeout = e.is_timeout(),
        error = %e,
        "Remote poll failed",
    );
    OrchestratorError::RemotePoll(e)
}

/// Fit remote counters into the stored columns with `0 <= progress <= total`.
fn clamp_counters(progress: i64, total: Option<i64>) -> (i32, Option<i32>) {
    let total = total.map(|t| t.clamp(0, i32::MAX as i64) as i32);
    let ceiling = total.unwrap_or(i32::MAX) as i64;
    (progress.clamp(0, ceiling) as i32, total)
}
