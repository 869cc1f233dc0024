/// Error types for Post Service
///
/// Store errors decide the outcome of a request. Cache and search errors are
/// soft failures: `PostService` logs and discards them on every path except
/// an explicit full-text search.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::search::ElasticsearchError;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input (empty title or content)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed request parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Post id does not exist in the record store
    #[error("Not found: {0}")]
    NotFound(String),

    /// The create transaction aborted; nothing was written
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Cache operation failed
    #[error("Cache error: {0}")]
    Cache(String),

    /// Search index operation failed
    #[error("Search error: {0}")]
    Search(String),

    /// The request deadline elapsed
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Startup configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures of the non-authoritative dependencies.
    pub fn is_soft(&self) -> bool {
        matches!(self, AppError::Cache(_) | AppError::Search(_))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Search(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Transaction(_)
            | AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("record not found".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

impl From<ElasticsearchError> for AppError {
    fn from(err: ElasticsearchError) -> Self {
        AppError::Search(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
