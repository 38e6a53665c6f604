pub mod modules;
pub mod tasks;
