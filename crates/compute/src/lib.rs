//! Client library for the external optimization compute service.
//!
//! The compute service exposes the same three calls for every module
//! (start, progress, stop) under module-specific paths. [`RemoteJobClient`]
//! is the seam the orchestrator depends on; [`api::ComputeApi`] is the
//! HTTP implementation.

pub mod api;
pub mod client;
pub mod messages;

pub use api::{ComputeApi, ComputeError};
pub use client::RemoteJobClient;
pub use messages::{JobProgress, RemoteStatus};
