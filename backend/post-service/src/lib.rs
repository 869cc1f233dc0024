/// Post Service Library
///
/// Blog-post service that keeps three stores consistent: PostgreSQL is the
/// system of record, Redis caches post snapshots, and Elasticsearch serves
/// full-text and related-post queries.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route configuration
/// - `models`: Posts, activity entries, search documents
/// - `services`: The orchestrator that sequences writes and composes reads
/// - `db`: Record store trait and PostgreSQL implementation
/// - `cache`: Cache layer trait and Redis implementation
/// - `search`: Search index trait and Elasticsearch implementation
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod search;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
