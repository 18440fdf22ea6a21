//! Audit capture and queries
//!
//! Every HTTP request (health and hub endpoints excluded) produces one row
//! in `audit_logs` plus one nested action row in `audit_log_actions`,
//! written by [`AuditLayer`] after the response is produced. The analytics
//! features only read these tables; the middleware is the single writer.
//!
//! ```no_run
//! use axum::Router;
//! use sqlx::PgPool;
//! use logboard_server::{audit, hub::HubState};
//!
//! # fn example(pool: PgPool) {
//! let app: Router = Router::new().layer(audit::AuditLayer::new(pool, HubState::new()));
//! # }
//! ```

mod middleware;
pub mod models;
pub mod queries;

pub use middleware::AuditLayer;
pub use models::{
    AuditEntry, AuditEntryAction, AuditFilter, NewAuditEntry, NewAuditEntryAction,
    DEFAULT_AUDIT_QUERY_LIMIT, MAX_AUDIT_QUERY_LIMIT,
};
pub use queries::{
    create_audit_entry, get_entry_actions, get_user_audit_entries, recent_audit_entries,
    search_audit_entries,
};
