//! Application-log dashboard aggregation
//!
//! Counts, level distribution, hourly buckets and top errors are
//! aggregated in SQL; response-time percentiles are computed in memory
//! over the sorted duration column so the index contract
//! `ceil(n * p) - 1` holds exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::stats::{per_minute_rate, percentage, percentile};
use crate::features::shared::validation::DateRange;
use crate::models::LogLevel;

/// Complete application-log dashboard payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogDashboardResponse {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_count: i64,
    pub today_count: i64,
    pub error_count: i64,
    pub warning_count: i64,
    /// Percentage of rows at Error level or above, 0 when the range is empty
    pub error_rate: f64,
    pub logs_per_minute: f64,
    pub errors_per_minute: f64,
    pub level_distribution: Vec<LevelCount>,
    pub hourly: Vec<HourlyBucket>,
    pub top_errors: Vec<TopError>,
    pub response_times: ResponseTimePercentiles,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelCount {
    pub level: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub hour: DateTime<Utc>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopError {
    /// Exception type, parsed from everything before the first colon
    pub exception_type: String,
    pub count: i64,
    pub last_seen: DateTime<Utc>,
}

/// Duration percentiles over rows that carry a duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseTimePercentiles {
    pub p50: i64,
    pub p90: i64,
    pub p95: i64,
    pub p99: i64,
    pub sample_count: i64,
}

/// Error type for the log dashboard query
#[derive(Debug, thiserror::Error)]
pub enum LogDashboardError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    range: DateRange,
    top_n: i64,
) -> Result<LogDashboardResponse, LogDashboardError> {
    let (total_count, error_count, warning_count): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COUNT(*) FILTER (WHERE level >= 4),
            COUNT(*) FILTER (WHERE level = 3)
        FROM app_logs
        WHERE timestamp BETWEEN $1 AND $2
        "#,
    )
    .bind(range.start)
    .bind(range.end)
    .fetch_one(&pool)
    .await?;

    let today_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM app_logs WHERE timestamp >= date_trunc('day', NOW())",
    )
    .fetch_one(&pool)
    .await?;

    let level_counts: Vec<(i16, i64)> = sqlx::query_as(
        r#"
        SELECT level, COUNT(*)
        FROM app_logs
        WHERE timestamp BETWEEN $1 AND $2
        GROUP BY level
        ORDER BY level
        "#,
    )
    .bind(range.start)
    .bind(range.end)
    .fetch_all(&pool)
    .await?;

    let hourly: Vec<(DateTime<Utc>, i64)> = sqlx::query_as(
        r#"
        SELECT date_trunc('hour', timestamp) AS hour, COUNT(*)
        FROM app_logs
        WHERE timestamp BETWEEN $1 AND $2
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
        SELECT split_part(split_part(exception, E'\n', 1), ': ', 1), COUNT(*), MAX(timestamp)
        FROM app_logs
        WHERE exception IS NOT NULL AND timestamp BETWEEN $1 AND $2
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

    let durations: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT duration_ms
        FROM app_logs
        WHERE duration_ms IS NOT NULL AND timestamp BETWEEN $1 AND $2
        ORDER BY duration_ms
        "#,
    )
    .bind(range.start)
    .bind(range.end)
    .fetch_all(&pool)
    .await?;

    let elapsed_minutes = range.elapsed_minutes();

    Ok(LogDashboardResponse {
        start_time: range.start,
        end_time: range.end,
        total_count,
        today_count,
        error_count,
        warning_count,
        error_rate: percentage(error_count, total_count),
        logs_per_minute: per_minute_rate(total_count, elapsed_minutes),
        errors_per_minute: per_minute_rate(error_count, elapsed_minutes),
        level_distribution: level_counts
            .into_iter()
            .map(|(code, count)| LevelCount {
                level: LogLevel::from_i16(code).as_str().to_string(),
                count,
            })
            .collect(),
        hourly: hourly
            .into_iter()
            .map(|(hour, count)| HourlyBucket { hour, count })
            .collect(),
        top_errors: top_errors
            .into_iter()
            .map(|(exception_type, count, last_seen)| TopError {
                exception_type,
                count,
                last_seen,
            })
            .collect(),
        response_times: ResponseTimePercentiles {
            p50: percentile(&durations, 0.50),
            p90: percentile(&durations, 0.90),
            p95: percentile(&durations, 0.95),
            p99: percentile(&durations, 0.99),
            sample_count: durations.len() as i64,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::app_logs::insert_logs_bulk;
    use crate::models::NewApplicationLog;
    use chrono::Duration;

    fn last_day() -> DateRange {
        let now = Utc::now() + Duration::minutes(1);
        DateRange {
            start: now - Duration::hours(24),
            end: now,
        }
    }

    fn log(level: LogLevel, message: &str) -> NewApplicationLog {
        NewApplicationLog::event(level, message)
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_counts_and_distribution(pool: PgPool) -> Result<(), LogDashboardError> {
        let mut rows = vec![
            log(LogLevel::Information, "started"),
            log(LogLevel::Information, "request handled"),
            log(LogLevel::Warning, "slow request"),
            log(LogLevel::Error, "boom"),
        ];
        rows[3].exception = Some("IoError: connection refused".to_string());
        insert_logs_bulk(&pool, &rows).await.unwrap();

        let dashboard = handle(pool, last_day(), 10).await?;

        assert_eq!(dashboard.total_count, 4);
        assert_eq!(dashboard.error_count, 1);
        assert_eq!(dashboard.warning_count, 1);
        assert_eq!(dashboard.error_rate, 25.0);

        let info = dashboard
            .level_distribution
            .iter()
            .find(|l| l.level == "information")
            .unwrap();
        assert_eq!(info.count, 2);

        assert_eq!(dashboard.top_errors.len(), 1);
        assert_eq!(dashboard.top_errors[0].exception_type, "IoError");

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_percentiles_over_durations(pool: PgPool) -> Result<(), LogDashboardError> {
        let rows: Vec<NewApplicationLog> = (1..=100)
            .map(|i| {
                let mut row = log(LogLevel::Information, "request");
                row.duration_ms = Some(i);
                row
            })
            .collect();
        insert_logs_bulk(&pool, &rows).await.unwrap();

        let dashboard = handle(pool, last_day(), 10).await?;

        assert_eq!(dashboard.response_times.sample_count, 100);
        assert_eq!(dashboard.response_times.p50, 50);
        assert_eq!(dashboard.response_times.p95, 95);
        assert_eq!(dashboard.response_times.p99, 99);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_empty_range_is_all_zeroes(pool: PgPool) -> Result<(), LogDashboardError> {
        let dashboard = handle(pool, last_day(), 10).await?;

        assert_eq!(dashboard.total_count, 0);
        assert_eq!(dashboard.error_rate, 0.0);
        assert_eq!(dashboard.response_times.p99, 0);
        assert!(dashboard.level_distribution.is_empty());

        Ok(())
    }
}
