//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use blendopt_api::config::{ComputeConfig, ServerConfig};
use blendopt_api::router::build_app_router;
use blendopt_api::state::AppState;
use blendopt_compute::{ComputeError, JobProgress, RemoteJobClient, RemoteStatus};
use blendopt_core::modules::Endpoints;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

/// Compute service stand-in. Starts hand out `job-1`, `job-2`, ...; polls
/// replay the script, then report "running, nothing new".
#[derive(Default)]
pub struct FakeCompute {
    polls: Mutex<VecDeque<Result<JobProgress, ComputeError>>>,
    starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl FakeCompute {
    pub fn push_poll(&self, status: RemoteStatus, progress: i64, total: i64, results: Vec<Value>) {
        self.polls.lock().unwrap().push_back(Ok(JobProgress {
            status,
            progress,
            total: Some(total),
            results,
            error: None,
        }));
    }

    pub fn push_poll_error(&self, err: ComputeError) {
        self.polls.lock().unwrap().push_back(Err(err));
    }
}

#[async_trait]
impl RemoteJobClient for FakeCompute {
    async fn start(&self, _endpoints: &Endpoints, _payload: &Value) -> Result<String, ComputeError> {
        let n = self.starts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("job-{n}"))
    }

    async fn poll(&self, _endpoints: &Endpoints, _correlation_id: &str) -> Result<JobProgress, ComputeError> {
        self.polls.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(JobProgress {
                status: RemoteStatus::Running,
                progress: 0,
                total: None,
                results: vec![],
                error: None,
            })
        })
    }

    async fn stop(&self, _endpoints: &Endpoints, _correlation_id: &str) -> Result<(), ComputeError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".into()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        compute: ComputeConfig {
            base_url: "http://compute.test".into(),
            timeout_secs: 5,
        },
        result_cache_max_entries: 8,
    }
}

/// Build the full application router over `pool` with a fresh fake
/// compute service.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(FakeCompute::default()))
}

pub fn build_test_app_with(pool: PgPool, compute: Arc<FakeCompute>) -> Router {
    build_test_app_with_config(pool, compute, test_config())
}

pub fn build_test_app_with_config(
    pool: PgPool,
    compute: Arc<FakeCompute>,
    config: ServerConfig,
) -> Router {
    let state = AppState::new(pool, config.clone(), compute);
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub async fn insert_reference(pool: &PgPool, kind: &str, name: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO reference_records (kind, name, composition, unit_price) \
         VALUES ($1, $2, '{\"TFe\": 60.0}', 95.0) RETURNING id",
    )
    .bind(kind)
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub async fn insert_template(pool: &PgPool, module: &str, selected_ids: &[i64]) {
    sqlx::query("INSERT INTO optimization_configs (owner_id, module, selected_ids) VALUES (NULL, $1, $2)")
        .bind(module)
        .bind(selected_ids)
        .execute(pool)
        .await
        .unwrap();
}
