//! Domain logic shared by every BlendOpt crate.
//!
//! Everything here is pure: no database, no network, no logging. The
//! orchestrator and API layers feed data in and act on what comes out.

pub mod assembly;
pub mod error;
pub mod modules;
pub mod pagination;
pub mod path;
pub mod resolution;
pub mod types;
