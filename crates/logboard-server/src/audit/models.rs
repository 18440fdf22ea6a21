//! Audit data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// ============================================================================
// Audit Query Constants
// ============================================================================

/// Default number of audit entries returned per query
pub const DEFAULT_AUDIT_QUERY_LIMIT: i64 = 100;

/// Maximum number of audit entries that can be returned in a single query.
/// This prevents excessive memory usage and query timeouts.
pub const MAX_AUDIT_QUERY_LIMIT: i64 = 1000;

/// One intercepted HTTP request, as recorded by the audit middleware
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    /// Unique identifier for the audit entry
    pub id: Uuid,
    /// User who performed the request (nullable for anonymous requests)
    pub user_id: Option<Uuid>,
    /// Display name of the user, when known
    pub user_name: Option<String>,
    /// Instant the request started executing
    pub execution_time: DateTime<Utc>,
    /// Wall-clock duration of the request in milliseconds
    pub duration_ms: i64,
    /// HTTP method
    pub http_method: String,
    /// Request path and query string
    pub url: String,
    /// Response status code, absent when the request never produced one
    pub http_status_code: Option<i32>,
    /// Client IP address (IPv4 or IPv6)
    pub client_ip: Option<String>,
    /// Client user agent string
    pub browser_info: Option<String>,
    /// Correlation identifier propagated across services
    pub correlation_id: Option<String>,
    /// Exception text for failed requests
    pub exception: Option<String>,
}

/// One service-method invocation nested under an audit entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntryAction {
    pub id: Uuid,
    pub audit_log_id: Uuid,
    /// Logical service the request was routed to
    pub service_name: String,
    /// Method invoked on that service
    pub method_name: String,
    /// Invocation parameters captured from the request body
    pub parameters: Option<JsonValue>,
    pub execution_time: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Input for recording an audit entry with its action rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub execution_time: DateTime<Utc>,
    pub duration_ms: i64,
    pub http_method: String,
    pub url: String,
    pub http_status_code: Option<i32>,
    pub client_ip: Option<String>,
    pub browser_info: Option<String>,
    pub correlation_id: Option<String>,
    pub exception: Option<String>,
    pub actions: Vec<NewAuditEntryAction>,
}

/// Input for one action row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditEntryAction {
    pub service_name: String,
    pub method_name: String,
    pub parameters: Option<JsonValue>,
    pub execution_time: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Optional predicates applied in sequence when searching audit entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Exact user match
    pub user_id: Option<Uuid>,
    /// Exact HTTP method match
    pub http_method: Option<String>,
    /// Case-insensitive substring match on the URL
    pub url_contains: Option<String>,
    /// Inclusive lower bound on the status code
    pub min_status_code: Option<i32>,
    /// Inclusive upper bound on the status code
    pub max_status_code: Option<i32>,
    /// Only requests with (true) or without (false) exception text
    pub has_exception: Option<bool>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_filter_default_is_open() {
        let filter = AuditFilter::default();
        assert!(filter.user_id.is_none());
        assert!(filter.http_method.is_none());
        assert!(filter.start_time.is_none());
    }

    #[test]
    fn test_new_audit_entry_serialization() {
        let entry = NewAuditEntry {
            user_id: None,
            user_name: Some("admin".to_string()),
            execution_time: Utc::now(),
            duration_ms: 12,
            http_method: "GET".to_string(),
            url: "/api/v1/log-analytics/recent".to_string(),
            http_status_code: Some(200),
            client_ip: Some("127.0.0.1".to_string()),
            browser_info: None,
            correlation_id: None,
            exception: None,
            actions: vec![],
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["http_method"], "GET");
        assert_eq!(json["http_status_code"], 200);
    }
}
