use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blendopt_core::error::CoreError;
use blendopt_orchestrator::OrchestratorError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`], [`OrchestratorError`] and sqlx errors. Implements [`IntoResponse`] to produce
/// consistent `{ "error", "code" }` JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `blendopt_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A task orchestration error.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type ErrorParts = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Orchestrator(err) => classify_orchestrator_error(err),
            AppError::Database(err) => classify_sqlx_error(err),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> ErrorParts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(err: &CoreError) -> ErrorParts {
    match err {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::ConfigurationMissing { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "CONFIGURATION_MISSING",
            err.to_string(),
        ),
    }
}

fn classify_orchestrator_error(err: &OrchestratorError) -> ErrorParts {
    match err {
        OrchestratorError::NotFound(correlation_id) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Task with correlation id {correlation_id} not found"),
        ),
        OrchestratorError::ConfigurationMissing { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "CONFIGURATION_MISSING",
            err.to_string(),
        ),
        OrchestratorError::RemoteStart(_) => {
            (StatusCode::BAD_GATEWAY, "REMOTE_START_FAILED", err.to_string())
        }
        OrchestratorError::RemotePoll(_) => {
            (StatusCode::BAD_GATEWAY, "REMOTE_POLL_FAILED", err.to_string())
        }
        OrchestratorError::CacheFull { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "CACHE_FULL",
            err.to_string(),
        ),
        OrchestratorError::Core(core) => classify_core_error(core),
        OrchestratorError::Database(db) => classify_sqlx_error(db),
        OrchestratorError::Persistence(_) | OrchestratorError::Internal(_) => {
            tracing::error!(error = %err, "Orchestration error");
            internal()
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorParts {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
