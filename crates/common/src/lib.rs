//! Symposium Common Library
//!
//! Shared code for the Symposium peer-review service including:
//! - Database models and repository patterns
//! - Review domain logic (status aggregation, lifecycle, visibility)
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - File storage abstraction
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod review;
pub mod storage;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};
pub use review::{ArticleLifecycle, ReviewStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Label of the first version of every article
pub const INITIAL_VERSION_LABEL: &str = "1.0";
