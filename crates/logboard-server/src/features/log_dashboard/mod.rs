//! Application-log analytics feature
//!
//! Dashboard aggregation, filtered search, export, recent listing,
//! applications list, and system health over `app_logs`.

pub mod export;
pub mod queries;
pub mod routes;

pub use routes::log_analytics_routes;
