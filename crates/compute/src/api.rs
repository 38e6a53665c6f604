//! REST API client for the compute service.
//!
//! Wraps the start / progress / stop endpoints using [`reqwest`]. Every
//! request is bounded by the client-wide timeout.

use std::time::Duration;

use async_trait::async_trait;
use blendopt_core::modules::Endpoints;
use reqwest::{StatusCode, Url};

use crate::client::RemoteJobClient;
use crate::messages::{JobProgress, StartResponse};

/// HTTP client for the compute service.
pub struct ComputeApi {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the compute REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The compute service returned a non-2xx status code.
    #[error("Compute API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The compute service does not know the correlation id.
    #[error("Compute service has no job {0}")]
    UnknownJob(String),

    /// A 2xx response whose body is not usable.
    #[error("Invalid compute response: {0}")]
    InvalidResponse(String),
}

impl ComputeError {
    /// Whether the remote job can no longer make progress. Anything else
    /// is worth another poll.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::UnknownJob(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}

impl ComputeApi {
    /// Create a new API client.
    ///
    /// * `base_url` - e.g. `http://compute:8000`.
    /// * `timeout` - upper bound for every request.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ComputeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}{stop}{correlation_id}` with the id percent-encoded as a
    /// single path segment.
    fn stop_url(&self, endpoints: &Endpoints, correlation_id: &str) -> Result<Url, ComputeError> {
        let mut url = Url::parse(&self.url(endpoints.stop))
            .map_err(|e| ComputeError::InvalidResponse(format!("invalid stop url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ComputeError::InvalidResponse("stop url cannot be a base".into()))?
            .pop_if_empty()
            .push(correlation_id);
        Ok(url)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ComputeError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ComputeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ComputeError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ComputeError> {
        let response = Self::ensure_success(response).await?;
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ComputeError::InvalidResponse(e.to_string())
            } else {
                ComputeError::Request(e)
            }
        })
    }
}

#[async_trait]
impl RemoteJobClient for ComputeApi {
    async fn start(
        &self,
        endpoints: &Endpoints,
        payload: &serde_json::Value,
    ) -> Result<String, ComputeError> {
        let response = self
            .client
            .post(self.url(endpoints.start))
            .json(payload)
            .send()
            .await?;

        let started: StartResponse = Self::parse_response(response).await?;
        let correlation_id = started.correlation_id.trim().to_string();
        if correlation_id.is_empty() {
            return Err(ComputeError::InvalidResponse(
                "start response carried an empty correlationId".into(),
            ));
        }

        tracing::debug!(path = endpoints.start, %correlation_id, "Remote job started");
        Ok(correlation_id)
    }

    async fn poll(
        &self,
        endpoints: &Endpoints,
        correlation_id: &str,
    ) -> Result<JobProgress, ComputeError> {
        let response = self
            .client
            .get(self.url(endpoints.progress))
            .query(&[("correlationId", correlation_id)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ComputeError::UnknownJob(correlation_id.to_string()));
        }
        Self::parse_response(response).await
    }

    async fn stop(&self, endpoints: &Endpoints, correlation_id: &str) -> Result<(), ComputeError> {
        let url = self.stop_url(endpoints, correlation_id)?;
        let response = self.client.post(url).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blendopt_core::modules::OptimizationModule;

    fn api() -> ComputeApi {
        ComputeApi::with_client(reqwest::Client::new(), "http://compute:8000/".to_string())
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(api().base_url(), "http://compute:8000");
    }

    #[test]
    fn stop_url_appends_encoded_id() {
        let endpoints = &OptimizationModule::CoalBlend.adapter().endpoints;
        let url = api().stop_url(endpoints, "job 1/2").unwrap();
        assert_eq!(url.as_str(), "http://compute:8000/coal/blend/stop/job%201%2F2");
    }

    #[test]
    fn only_unknown_job_is_unrecoverable() {
        assert!(ComputeError::UnknownJob("x".into()).is_unrecoverable());
        assert!(!ComputeError::ApiError {
            status: 503,
            body: String::new()
        }
        .is_unrecoverable());
    }
}
