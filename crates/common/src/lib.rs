//! Citegraph Common Library
//!
//! Shared code for the Citegraph gateway including:
//! - Configuration management
//! - Error types and handling
//! - Database models, repository and schema bootstrap
//! - OpenAlex client with outbound rate limiting
//! - Paper/author cache, citation graph builder and search facade
//! - Reading library (collections, saved papers, BibTeX export)
//! - Metrics and observability

pub mod authors;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod graph;
pub mod library;
pub mod metrics;
pub mod openalex;
pub mod search;
pub mod views;

// Re-export commonly used types
pub use cache::PaperCache;
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};
pub use openalex::{OpenAlexClient, WorkSource};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
