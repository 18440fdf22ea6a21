//! Logboard Server Library
//!
//! Backend for browsing, searching, aggregating, and exporting operational
//! records stored in PostgreSQL:
//!
//! - **Application logs** (`app_logs`): structured events written by the
//!   logging pipeline (see [`persist`]) or bulk seeding
//! - **Audit logs** (`audit_logs` + `audit_log_actions`): one row per
//!   intercepted HTTP request, captured by [`audit::AuditLayer`]
//!
//! # Architecture
//!
//! Feature slices under [`features`] own the read side: dashboard
//! aggregation, filtered search, export, recent listings, applications and
//! health. Dashboards are aggregated in SQL and cached briefly in
//! [`cache::DashboardCache`]. A WebSocket [`hub`] lets dashboards join
//! refresh groups; data delivery stays on REST polling.
//!
//! ## Framework Stack
//!
//! - **Axum**: web framework (REST + WebSocket)
//! - **SQLx**: PostgreSQL access and migrations
//! - **Tower / tower-http**: middleware (trace, CORS, compression, rate
//!   limiting) plus the audit capture layer
//! - **tracing**: structured logging, bridged into `app_logs` by the
//!   persistence layer
//!
//! # Example
//!
//! ```no_run
//! use logboard_server::{config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     sqlx::migrate!("../../migrations").run(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod audit;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod hub;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod persist;

// Re-export commonly used types
pub use error::{ServerError, ServerResult};
