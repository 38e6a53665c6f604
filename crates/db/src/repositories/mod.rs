//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod config_repo;
pub mod reference_repo;
pub mod task_repo;
pub mod task_result_repo;

pub use config_repo::ConfigRepo;
pub use reference_repo::ReferenceRepo;
pub use task_repo::TaskRepo;
pub use task_result_repo::TaskResultRepo;
