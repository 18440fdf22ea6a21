//! Audit dashboard aggregation
//!
//! Builds the full dashboard shape for a validated date range. Counts,
//! distributions, hourly buckets and top-N lists are aggregated in SQL;
//! queries run sequentially and each failure surfaces as a database error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::stats::percentage;
use crate::features::shared::validation::DateRange;

/// Complete audit dashboard payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditDashboardResponse {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_count: i64,
    pub today_count: i64,
    pub success_count: i64,
    pub failure_count: i64,
    /// Percentage of requests that succeeded, 0 when the range is empty
    pub success_rate: f64,
    pub avg_duration_ms: f64,
    pub max_duration_ms: i64,
    pub severity: SeverityBreakdown,
    pub hourly: Vec<HourlyBucket>,
    pub top_errors: Vec<TopError>,
    pub top_users: Vec<TopUser>,
    pub top_methods: Vec<TopMethod>,
}

/// Severity derived from status code and exception presence:
/// error = exception or 5xx, warning = 4xx, info = the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub error: i64,
    pub warning: i64,
    pub info: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub hour: DateTime<Utc>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopError {
    /// First line of the exception text
    pub error: String,
    pub count: i64,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUser {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopMethod {
    pub service_name: String,
    pub method_name: String,
    pub count: i64,
    pub avg_duration_ms: f64,
}

/// Error type for the audit dashboard query
#[derive(Debug, thiserror::Error)]
pub enum AuditDashboardError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    range: DateRange,
    top_n: i64,
) -> Result<AuditDashboardResponse, AuditDashboardError> {
    let total_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_logs WHERE execution_time BETWEEN $1 AND $2",
    )
    .bind(range.start)
    .bind(range.end)
    .fetch_one(&pool)
    .await?;

    let today_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_logs WHERE execution_time >= date_trunc('day', NOW())",
    )
    .fetch_one(&pool)
    .await?;

    let (success_count, failure_count, error_count, warning_count, avg_duration_ms, max_duration_ms): (i64, i64, i64, i64, f64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE exception IS NULL AND COALESCE(http_status_code, 0) < 400),
            COUNT(*) FILTER (WHERE exception IS NOT NULL OR COALESCE(http_status_code, 0) >= 400),
            COUNT(*) FILTER (WHERE exception IS NOT NULL OR COALESCE(http_status_code, 0) >= 500),
            COUNT(*) FILTER (WHERE exception IS NULL AND http_status_code BETWEEN 400 AND 499),
            COALESCE(AVG(duration_ms), 0)::float8,
            COALESCE(MAX(duration_ms), 0)
        FROM audit_logs
        WHERE execution_time BETWEEN $1 AND $2
        "#,
    )
    .bind(range.start)
    .bind(range.end)
    .fetch_one(&pool)
    .await?;

    let hourly: Vec<(DateTime<Utc>, i64)> = sqlx::query_as(
        r#"
        SELECT date_trunc('hour', execution_time) AS hour, COUNT(*)
        FROM audit_logs
        WHERE execution_time BETWEEN $1 AND $2
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(range.start)
    .bind(range.end)
    .fetch_all(&pool)
    .await?;

    let top_errors: Vec<(String, i64, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT split_part(exception, E'\n', 1), COUNT(*), MAX(execution_time)
        FROM audit_logs
        WHERE exception IS NOT NULL AND execution_time BETWEEN $1 AND $2
        GROUP BY 1
        ORDER BY 2 DESC
        LIMIT $3
        "#,
    )
    .bind(range.start)
    .bind(range.end)
    .bind(top_n)
    .fetch_all(&pool)
    .await?;

    let top_users: Vec<(Uuid, Option<String>, i64)> = sqlx::query_as(
        r#"
        SELECT user_id, MAX(user_name), COUNT(*)
        FROM audit_logs
        WHERE user_id IS NOT NULL AND execution_time BETWEEN $1 AND $2
        GROUP BY user_id
        ORDER BY 3 DESC
        LIMIT $3
        "#,
    )
    .bind(range.start)
    .bind(range.end)
    .bind(top_n)
    .fetch_all(&pool)
    .await?;

    let top_methods: Vec<(String, String, i64, f64)> = sqlx::query_as(
        r#"
        SELECT a.service_name, a.method_name, COUNT(*),
               COALESCE(AVG(a.duration_ms), 0)::float8
        FROM audit_log_actions a
        JOIN audit_logs l ON l.id = a.audit_log_id
        WHERE l.execution_time BETWEEN $1 AND $2
        GROUP BY 1, 2
        ORDER BY 3 DESC
        LIMIT $3
        "#,
    )
    .bind(range.start)
    .bind(range.end)
    .bind(top_n)
    .fetch_all(&pool)
    .await?;

    let info_count = total_count - error_count - warning_count;

    Ok(AuditDashboardResponse {
        start_time: range.start,
        end_time: range.end,
        total_count,
        today_count,
        success_count,
        failure_count,
        success_rate: percentage(success_count, total_count),
        avg_duration_ms,
        max_duration_ms,
        severity: SeverityBreakdown {
            error: error_count,
            warning: warning_count,
            info: info_count.max(0),
        },
        hourly: hourly
            .into_iter()
            .map(|(hour, count)| HourlyBucket { hour, count })
            .collect(),
        top_errors: top_errors
            .into_iter()
            .map(|(error, count, last_seen)| TopError {
                error,
                count,
                last_seen,
            })
            .collect(),
        top_users: top_users
            .into_iter()
            .map(|(user_id, user_name, count)| TopUser {
                user_id,
                user_name,
                count,
            })
            .collect(),
        top_methods: top_methods
            .into_iter()
            .map(|(service_name, method_name, count, avg_duration_ms)| TopMethod {
                service_name,
                method_name,
                count,
                avg_duration_ms,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::models::{NewAuditEntry, NewAuditEntryAction};
    use crate::audit::queries::create_audit_entry;
    use chrono::Duration;

    fn entry(
        status: i32,
        duration_ms: i64,
        exception: Option<&str>,
        user_id: Option<Uuid>,
    ) -> NewAuditEntry {
        NewAuditEntry {
            user_id,
            user_name: user_id.map(|_| "operator".to_string()),
            execution_time: Utc::now(),
            duration_ms,
            http_method: "GET".to_string(),
            url: "/api/v1/log-analytics/recent".to_string(),
            http_status_code: Some(status),
            client_ip: None,
            browser_info: None,
            correlation_id: None,
            exception: exception.map(|e| e.to_string()),
            actions: vec![NewAuditEntryAction {
                service_name: "log-analytics".to_string(),
                method_name: "recent".to_string(),
                parameters: None,
                execution_time: Utc::now(),
                duration_ms,
            }],
        }
    }

    fn last_day() -> DateRange {
        let now = Utc::now() + Duration::minutes(1);
        DateRange {
            start: now - Duration::hours(24),
            end: now,
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_dashboard_counts_and_severity(pool: PgPool) -> Result<(), AuditDashboardError> {
        create_audit_entry(&pool, entry(200, 10, None, None)).await.unwrap();
        create_audit_entry(&pool, entry(200, 30, None, None)).await.unwrap();
        create_audit_entry(&pool, entry(404, 5, None, None)).await.unwrap();
        create_audit_entry(&pool, entry(500, 80, Some("HttpError: boom"), None))
            .await
            .unwrap();

        let dashboard = handle(pool, last_day(), 10).await?;

        assert_eq!(dashboard.total_count, 4);
        assert_eq!(dashboard.success_count, 2);
        assert_eq!(dashboard.failure_count, 2);
        assert_eq!(dashboard.success_rate, 50.0);
        assert_eq!(dashboard.severity.error, 1);
        assert_eq!(dashboard.severity.warning, 1);
        assert_eq!(dashboard.severity.info, 2);
        assert_eq!(dashboard.max_duration_ms, 80);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_dashboard_empty_range(pool: PgPool) -> Result<(), AuditDashboardError> {
        let dashboard = handle(pool, last_day(), 10).await?;

        assert_eq!(dashboard.total_count, 0);
        assert_eq!(dashboard.success_rate, 0.0);
        assert!(dashboard.hourly.is_empty());
        assert!(dashboard.top_errors.is_empty());

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_dashboard_top_lists(pool: PgPool) -> Result<(), AuditDashboardError> {
        let busy_user = Uuid::new_v4();
        for _ in 0..3 {
            create_audit_entry(&pool, entry(200, 10, None, Some(busy_user)))
                .await
                .unwrap();
        }
        create_audit_entry(&pool, entry(200, 10, None, Some(Uuid::new_v4())))
            .await
            .unwrap();
        create_audit_entry(&pool, entry(500, 9, Some("Timeout: deadline exceeded"), None))
            .await
            .unwrap();
        create_audit_entry(&pool, entry(500, 9, Some("Timeout: deadline exceeded"), None))
            .await
            .unwrap();

        let dashboard = handle(pool, last_day(), 10).await?;

        assert_eq!(dashboard.top_users[0].user_id, busy_user);
        assert_eq!(dashboard.top_users[0].count, 3);
        assert_eq!(dashboard.top_errors[0].error, "Timeout: deadline exceeded");
        assert_eq!(dashboard.top_errors[0].count, 2);
        assert_eq!(dashboard.top_methods[0].service_name, "log-analytics");
        assert_eq!(dashboard.top_methods[0].count, 6);

        Ok(())
    }
}
