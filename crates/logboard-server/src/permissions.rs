//! Endpoint permissions
//!
//! Every analytics endpoint is gated by one permission from a fixed
//! hierarchy. Grants are read per-request from the `x-permissions` header
//! (comma separated permission names; `*` grants everything), injected by
//! the authenticating gateway. Real token parsing is the production
//! follow-up.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::collections::HashSet;

use crate::api::response::ApiError;

/// The fixed permission hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// View the audit dashboard
    Dashboard,
    /// View the application-log dashboard
    AppDashboard,
    /// Browse and list application logs
    ViewLogs,
    /// Run filtered application-log searches
    SearchLogs,
    /// Export application logs
    ExportLogs,
    /// Change analytics configuration
    ManageConfiguration,
    /// Browse and search audit entries
    AuditView,
    /// Export audit entries
    AuditExport,
    /// Delete audit entries
    AuditDelete,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "log-analytics.dashboard",
            Self::AppDashboard => "log-analytics.app-dashboard",
            Self::ViewLogs => "log-analytics.view",
            Self::SearchLogs => "log-analytics.search",
            Self::ExportLogs => "log-analytics.export",
            Self::ManageConfiguration => "log-analytics.manage-configuration",
            Self::AuditView => "audit-logs.view",
            Self::AuditExport => "audit-logs.export",
            Self::AuditDelete => "audit-logs.delete",
        }
    }

    /// All permissions, in display order
    pub fn all() -> &'static [Permission] {
        &[
            Self::Dashboard,
            Self::AppDashboard,
            Self::ViewLogs,
            Self::SearchLogs,
            Self::ExportLogs,
            Self::ManageConfiguration,
            Self::AuditView,
            Self::AuditExport,
            Self::AuditDelete,
        ]
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Permissions granted to the current request
#[derive(Debug, Clone)]
pub struct Grants {
    all: bool,
    granted: HashSet<String>,
}

impl Grants {
    /// Parse the header value, e.g. `"log-analytics.view,audit-logs.view"`
    /// or `"*"`.
    pub fn parse(header: Option<&str>) -> Self {
        let mut all = false;
        let mut granted = HashSet::new();

        if let Some(value) = header {
            for part in value.split(',') {
                let name = part.trim();
                if name.is_empty() {
                    continue;
                }
                if name == "*" {
                    all = true;
                } else {
                    granted.insert(name.to_lowercase());
                }
            }
        }

        Self { all, granted }
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.all || self.granted.contains(permission.as_str())
    }

    /// Gate a handler on one permission.
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "Missing permission '{}'",
                permission
            )))
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Grants
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-permissions")
            .and_then(|v| v.to_str().ok());
        Ok(Grants::parse(header))
    }
}
