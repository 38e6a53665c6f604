//! Remote task orchestration and incremental result caching.
//!
//! [`engine::TaskOrchestrator`] drives one generic lifecycle for every
//! optimization module:
//!
//! 1. assemble a payload from stored configuration ([`assembler`]),
//! 2. start the remote job and record the task,
//! 3. on each client poll, append the new result batch to the
//!    [`cache`] and update progress,
//! 4. on the first terminal observation (or a stop), persist the
//!    accumulated results exactly once ([`finalizer`]),
//! 5. serve sorted, paginated, name-resolved views ([`resolver`]).
//!
//! Storage and transport are reached through traits ([`store`],
//! [`blendopt_compute::RemoteJobClient`]) so every collaborator can be
//! substituted.
//!
//! The result cache lives in this process. Running several orchestrator
//! processes without sticky routing splits a task's batches across
//! processes; deploy a single instance, route by correlation id, or back
//! [`cache::ResultCache`] with a shared store.

pub mod assembler;
pub mod cache;
pub mod engine;
pub mod error;
pub mod finalizer;
pub mod resolver;
pub mod store;

pub use engine::{CacheUsage, ProgressView, StartedTask, TaskOrchestrator, TaskSummary};
pub use error::OrchestratorError;
