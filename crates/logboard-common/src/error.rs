//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for Logboard operations
pub type Result<T> = std::result::Result<T, LogboardError>;

/// Main error type for Logboard
#[derive(Error, Debug)]
pub enum LogboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
