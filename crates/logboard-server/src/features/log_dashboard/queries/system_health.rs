//! System health query
//!
//! Database connectivity, table sizes, and error activity over the last
//! hour. A failing connectivity probe yields a degraded payload instead of
//! an error response.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::queries as audit_queries;
use crate::db::app_logs;
use crate::error::ServerResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    /// "connected" or "unreachable"
    pub database: String,
    pub app_log_count: i64,
    pub audit_log_count: i64,
    pub errors_last_hour: i64,
    pub failed_requests_last_hour: i64,
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool) -> ServerResult<SystemHealthResponse> {
    if sqlx::query("SELECT 1").fetch_one(&pool).await.is_err() {
        tracing::error!("System health probe could not reach the database");
        return Ok(SystemHealthResponse {
            status: "degraded".to_string(),
            database: "unreachable".to_string(),
            app_log_count: 0,
            audit_log_count: 0,
            errors_last_hour: 0,
            failed_requests_last_hour: 0,
        });
    }

    let hour_ago = Utc::now() - Duration::hours(1);

    let app_log_count = app_logs::total_count(&pool).await?;
    let audit_log_count = audit_queries::total_count(&pool).await?;
    let errors_last_hour = app_logs::error_count_since(&pool, hour_ago).await?;
    let failed_requests_last_hour = audit_queries::failure_count_since(&pool, hour_ago).await?;

    Ok(SystemHealthResponse {
        status: "healthy".to_string(),
        database: "connected".to_string(),
        app_log_count,
        audit_log_count,
        errors_last_hour,
        failed_requests_last_hour,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::app_logs::insert_logs_bulk;
    use crate::models::{LogLevel, NewApplicationLog};

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_health_counts(pool: PgPool) -> ServerResult<()> {
        let rows = vec![
            NewApplicationLog::event(LogLevel::Information, "fine"),
            NewApplicationLog::event(LogLevel::Error, "broken"),
        ];
        insert_logs_bulk(&pool, &rows).await?;

        let health = handle(pool).await?;

        assert_eq!(health.status, "healthy");
        assert_eq!(health.database, "connected");
        assert_eq!(health.app_log_count, 2);
        assert_eq!(health.errors_last_hour, 1);

        Ok(())
    }
}
