pub mod config;
pub mod error;
pub mod models;
pub mod run_log;
pub mod services;
pub mod suites;

/// Harness version from Cargo.toml (single source of truth)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
