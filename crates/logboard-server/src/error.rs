//! Server-specific error types

use thiserror::Error;

/// Result type alias for server operations
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Internal server error type used by repositories and background tasks
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logboard error: {0}")]
    Common(#[from] logboard_common::LogboardError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}
