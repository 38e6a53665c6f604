//! Handlers for the `/tasks` resource.
//!
//! Tasks are addressed by the correlation id the compute service assigned
//! at start. Reading a running task's progress advances it by one remote
//! poll.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use blendopt_core::modules::OptimizationModule;
use blendopt_core::types::DbId;
use blendopt_db::models::status::TaskStatus;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::query::{ResultPageParams, TaskListParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /tasks`.
#[derive(Debug, Deserialize)]
pub struct StartTaskRequest {
    pub module: String,
    pub owner_id: DbId,
}

/// Response body for `POST /tasks/{correlation_id}/stop`.
#[derive(Debug, Serialize)]
pub struct StopTaskResponse {
    pub correlation_id: String,
    pub status: TaskStatus,
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

/// POST /api/v1/tasks
///
/// Assemble the module's payload from stored configuration and start the
/// remote job. Returns 201 with the task id and correlation id.
pub async fn start_task(
    State(state): State<AppState>,
    Json(input): Json<StartTaskRequest>,
) -> AppResult<impl IntoResponse> {
    let module: OptimizationModule = input.module.parse()?;
    let started = state
        .orchestrator
        .start_task(module, input.owner_id)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: started })))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/tasks?owner_id=
///
/// An owner's tasks, newest first.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> AppResult<impl IntoResponse> {
    let tasks = state
        .orchestrator
        .list_tasks(params.owner_id, params.limit, params.offset)
        .await?;

    Ok(Json(DataResponse { data: tasks }))
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// GET /api/v1/tasks/{correlation_id}
///
/// Status, counters, and one sorted page of results with identifiers
/// resolved to display names.
pub async fn get_progress(
    State(state): State<AppState>,
    Path(correlation_id): Path<String>,
    Query(params): Query<ResultPageParams>,
) -> AppResult<impl IntoResponse> {
    let request = params.into_page_request()?;
    let view = state
        .orchestrator
        .get_progress(&correlation_id, &request)
        .await?;

    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// Stop
// ---------------------------------------------------------------------------

/// POST /api/v1/tasks/{correlation_id}/stop
///
/// Stop the task and persist what it produced so far. Always ends in a
/// terminal status, even if the compute service does not acknowledge.
pub async fn stop_task(
    State(state): State<AppState>,
    Path(correlation_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let status = state.orchestrator.stop_task(&correlation_id).await?;

    Ok(Json(DataResponse {
        data: StopTaskResponse {
            correlation_id,
            status,
        },
    }))
}
