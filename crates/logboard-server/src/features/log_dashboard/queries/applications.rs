//! Applications listing
//!
//! The distinct application names observed in `app_logs`, supplemented by
//! names derived from audit action service names. There is no first-class
//! application entity; correlation is by string heuristics at query time.

use sqlx::PgPool;
use std::collections::BTreeSet;

use crate::error::ServerResult;

/// Derive an application name from a service-name string.
///
/// Takes the segment after the last dot and strips a trailing
/// `AppService`/`Service` suffix, so "ops.billing.InvoiceService" and
/// "InvoiceAppService" both become "Invoice".
pub fn derive_application_name(service_name: &str) -> String {
    let last = service_name.rsplit('.').next().unwrap_or(service_name);
    let trimmed = last
        .strip_suffix("AppService")
        .or_else(|| last.strip_suffix("Service"))
        .unwrap_or(last);

    if trimmed.is_empty() {
        last.to_string()
    } else {
        trimmed.to_string()
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool) -> ServerResult<Vec<String>> {
    let from_logs: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT application FROM app_logs WHERE application IS NOT NULL",
    )
    .fetch_all(&pool)
    .await?;

    let from_audit: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT service_name FROM audit_log_actions")
            .fetch_all(&pool)
            .await?;

    let mut names: BTreeSet<String> = from_logs.into_iter().collect();
    names.extend(from_audit.iter().map(|s| derive_application_name(s)));

    Ok(names.into_iter().collect())
}
