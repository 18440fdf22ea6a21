//! Audit analytics feature
//!
//! Dashboard aggregation, filtered search, export, and recent listing over
//! the audit tables written by [`crate::audit::AuditLayer`].

pub mod export;
pub mod queries;
pub mod routes;

pub use routes::audit_analytics_routes;
