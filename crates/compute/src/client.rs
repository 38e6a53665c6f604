//! Transport-agnostic interface to the compute service.

use async_trait::async_trait;
use blendopt_core::modules::Endpoints;

use crate::api::ComputeError;
use crate::messages::JobProgress;

/// The three calls the orchestrator makes against a remote job.
///
/// Every module shares this contract; `endpoints` selects the module.
#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    /// Submit a job and return its correlation id.
    async fn start(
        &self,
        endpoints: &Endpoints,
        payload: &serde_json::Value,
    ) -> Result<String, ComputeError>;

    /// Fetch the job's status plus the records completed since the last poll.
    async fn poll(
        &self,
        endpoints: &Endpoints,
        correlation_id: &str,
    ) -> Result<JobProgress, ComputeError>;

    /// Ask the compute service to stop the job.
    async fn stop(&self, endpoints: &Endpoints, correlation_id: &str) -> Result<(), ComputeError>;
}
