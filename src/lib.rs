//! sitepipe library
//!
//! Core functionality for the sitepipe asset pipeline: task definitions,
//! the series/parallel runner, the watcher and the live-reload server.

pub mod cli;
pub mod config;
pub mod server;
pub mod sources;
pub mod tasks;
pub mod transform;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use tasks::{Task, TaskContext, TaskReport};
