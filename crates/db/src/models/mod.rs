//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the DTOs used to insert it.

pub mod config;
pub mod reference;
pub mod status;
pub mod task;
pub mod task_result;
