//! HTTP API plumbing shared by all feature routes

pub mod response;

pub use response::{ApiError, ApiResponse, ApiResult, ErrorResponse};
