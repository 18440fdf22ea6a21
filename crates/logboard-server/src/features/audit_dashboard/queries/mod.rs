//! Read operations over the audit tables

pub mod get_dashboard;
pub mod recent;
pub mod search;

pub use get_dashboard::{AuditDashboardError, AuditDashboardResponse};
pub use search::SearchAuditLogsRequest;
