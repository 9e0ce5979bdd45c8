//! Shared utilities for agent pipelines
//!
//! This crate provides logging setup and process-level configuration used by
//! the binaries in the workspace. Library crates only emit `tracing` events;
//! installing a subscriber is left to the binary.

pub mod config;
pub mod logging;

pub use config::AppConfig;
pub use logging::init_tracing_with;
