//! Feature modules implementing the analytics API
//!
//! Each feature is a vertical slice owning its queries, route wiring, and
//! error mapping:
//!
//! - **audit_dashboard**: dashboard, search, export, and recent listing
//!   over the audit tables
//! - **log_dashboard**: dashboard, search, export, recent listing,
//!   applications list, and system health over the application-log table
//! - **shared**: pagination, date-range validation, statistics math, CSV
//!   rendering, export formats
//!
//! All slices are read-only; the single write path into the audit tables is
//! the audit middleware, and into `app_logs` the persistence layer and the
//! seeding repository.

pub mod audit_dashboard;
pub mod log_dashboard;
pub mod shared;

use axum::Router;
use std::sync::Arc;

use crate::cache::DashboardCache;
use crate::config::AnalyticsConfig;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool
    pub db: sqlx::PgPool,
    /// TTL cache for dashboard payloads
    pub cache: Arc<DashboardCache>,
    /// Analytics tuning knobs
    pub analytics: AnalyticsConfig,
}

/// Creates the main API router with all feature routes mounted
///
/// - `/audit-analytics` - audit dashboard, search, export, recent
/// - `/log-analytics` - application-log dashboard, search, export, recent,
///   applications, health
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest(
            "/audit-analytics",
            audit_dashboard::audit_analytics_routes().with_state(state.clone()),
        )
        .nest(
            "/log-analytics",
            log_dashboard::log_analytics_routes().with_state(state),
        )
}
