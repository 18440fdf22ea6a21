//! Application-log repository
//!
//! Filtered search, recent listing, range counts, and bulk seeding over the
//! `app_logs` table. Dashboard aggregations live with their feature slices;
//! this module owns the row-level access paths.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::error::ServerResult;
use crate::models::{ApplicationLog, NewApplicationLog};

/// Optional predicates applied in sequence by [`search_logs`].
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Inclusive lower bound on the level code
    pub min_level: Option<i16>,
    /// Inclusive upper bound on the level code
    pub max_level: Option<i16>,
    /// Case-insensitive substring match on the message
    pub message_contains: Option<String>,
    /// Exact application name
    pub application: Option<String>,
    /// Only rows with (true) or without (false) exception text
    pub has_exception: Option<bool>,
    /// Exact correlation identifier
    pub correlation_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl LogFilter {
    fn conditions(&self) -> (String, Vec<Condition>) {
        let mut sql = String::new();
        let mut binds = Vec::new();
        let mut n = 1;

        if let Some(min_level) = self.min_level {
            sql.push_str(&format!(" AND level >= ${}", n));
            binds.push(Condition::SmallInt(min_level));
            n += 1;
        }
        if let Some(max_level) = self.max_level {
            sql.push_str(&format!(" AND level <= ${}", n));
            binds.push(Condition::SmallInt(max_level));
            n += 1;
        }
        if let Some(ref needle) = self.message_contains {
            sql.push_str(&format!(" AND LOWER(message) LIKE ${}", n));
            binds.push(Condition::Text(format!("%{}%", needle.to_lowercase())));
            n += 1;
        }
        if let Some(ref application) = self.application {
            sql.push_str(&format!(" AND application = ${}", n));
            binds.push(Condition::Text(application.clone()));
            n += 1;
        }
        if let Some(ref correlation_id) = self.correlation_id {
            sql.push_str(&format!(" AND correlation_id = ${}", n));
            binds.push(Condition::Text(correlation_id.clone()));
            n += 1;
        }
        if let Some(start) = self.start_time {
            sql.push_str(&format!(" AND timestamp >= ${}", n));
            binds.push(Condition::Timestamp(start));
            n += 1;
        }
        if let Some(end) = self.end_time {
            sql.push_str(&format!(" AND timestamp <= ${}", n));
            binds.push(Condition::Timestamp(end));
        }
        match self.has_exception {
            Some(true) => sql.push_str(" AND exception IS NOT NULL"),
            Some(false) => sql.push_str(" AND exception IS NULL"),
            None => {},
        }

        (sql, binds)
    }
}

enum Condition {
    SmallInt(i16),
    Text(String),
    Timestamp(DateTime<Utc>),
}

macro_rules! bind_conditions {
    ($query:expr, $binds:expr) => {{
        let mut q = $query;
        for bind in $binds {
            q = match bind {
                Condition::SmallInt(v) => q.bind(*v),
                Condition::Text(v) => q.bind(v.clone()),
                Condition::Timestamp(v) => q.bind(*v),
            };
        }
        q
    }};
}

const SELECT_COLUMNS: &str = "id, timestamp, level, message, exception, application, \
                              http_method, request_path, status_code, duration_ms, \
                              correlation_id, request_id";

/// Search application logs with optional filters and skip/take pagination.
///
/// Returns the page of rows (newest first) and the total matching count.
pub async fn search_logs(
    pool: &PgPool,
    filter: &LogFilter,
    skip: i64,
    take: i64,
) -> ServerResult<(Vec<ApplicationLog>, i64)> {
    let (conditions, binds) = filter.conditions();

    let count_sql = format!("SELECT COUNT(*) FROM app_logs WHERE 1=1{}", conditions);
    let total: i64 = bind_conditions!(sqlx::query_scalar(&count_sql), &binds)
        .fetch_one(pool)
        .await?;

    let page_sql = format!(
        "SELECT {} FROM app_logs WHERE 1=1{} ORDER BY timestamp DESC LIMIT {} OFFSET {}",
        SELECT_COLUMNS, conditions, take, skip
    );
    let rows = bind_conditions!(sqlx::query_as::<_, ApplicationLog>(&page_sql), &binds)
        .fetch_all(pool)
        .await?;

    debug!(count = rows.len(), total, "Searched application logs");

    Ok((rows, total))
}

/// Fetch the newest application logs with skip/take.
pub async fn recent_logs(pool: &PgPool, skip: i64, take: i64) -> ServerResult<Vec<ApplicationLog>> {
    let sql = format!(
        "SELECT {} FROM app_logs ORDER BY timestamp DESC LIMIT $1 OFFSET $2",
        SELECT_COLUMNS
    );
    let rows = sqlx::query_as::<_, ApplicationLog>(&sql)
        .bind(take)
        .bind(skip)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Total number of stored application logs.
pub async fn total_count(pool: &PgPool) -> ServerResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_logs")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of rows at `Error` level or above since the given instant.
pub async fn error_count_since(pool: &PgPool, since: DateTime<Utc>) -> ServerResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM app_logs WHERE level >= 4 AND timestamp >= $1")
            .bind(since)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Insert one application log row.
pub async fn insert_log(pool: &PgPool, log: &NewApplicationLog) -> ServerResult<()> {
    sqlx::query(
        r#"
        INSERT INTO app_logs (
            timestamp, level, message, exception, application,
            http_method, request_path, status_code, duration_ms,
            correlation_id, request_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(log.timestamp)
    .bind(log.level.as_i16())
    .bind(&log.message)
    .bind(&log.exception)
    .bind(&log.application)
    .bind(&log.http_method)
    .bind(&log.request_path)
    .bind(&log.status_code)
    .bind(&log.duration_ms)
    .bind(&log.correlation_id)
    .bind(&log.request_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Bulk-insert seed rows in a single multi-row statement.
///
/// Uses an UNNEST insert so seeding thousands of rows costs one round trip
/// instead of one statement per row.
pub async fn insert_logs_bulk(pool: &PgPool, logs: &[NewApplicationLog]) -> ServerResult<u64> {
    if logs.is_empty() {
        return Ok(0);
    }

    let timestamps: Vec<DateTime<Utc>> = logs.iter().map(|l| l.timestamp).collect();
    let levels: Vec<i16> = logs.iter().map(|l| l.level.as_i16()).collect();
    let messages: Vec<String> = logs.iter().map(|l| l.message.clone()).collect();
    let exceptions: Vec<Option<String>> = logs.iter().map(|l| l.exception.clone()).collect();
    let applications: Vec<Option<String>> = logs.iter().map(|l| l.application.clone()).collect();
    let http_methods: Vec<Option<String>> = logs.iter().map(|l| l.http_method.clone()).collect();
    let request_paths: Vec<Option<String>> = logs.iter().map(|l| l.request_path.clone()).collect();
    let status_codes: Vec<Option<i32>> = logs.iter().map(|l| l.status_code).collect();
    let durations: Vec<Option<i64>> = logs.iter().map(|l| l.duration_ms).collect();
    let correlation_ids: Vec<Option<String>> =
        logs.iter().map(|l| l.correlation_id.clone()).collect();
    let request_ids: Vec<Option<String>> = logs.iter().map(|l| l.request_id.clone()).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO app_logs (
            timestamp, level, message, exception, application,
            http_method, request_path, status_code, duration_ms,
            correlation_id, request_id
        )
        SELECT * FROM UNNEST(
            $1::timestamptz[], $2::smallint[], $3::text[], $4::text[], $5::text[],
            $6::text[], $7::text[], $8::int4[], $9::int8[], $10::text[], $11::text[]
        )
        "#,
    )
    .bind(&timestamps)
    .bind(&levels)
    .bind(&messages)
    .bind(&exceptions)
    .bind(&applications)
    .bind(&http_methods)
    .bind(&request_paths)
    .bind(&status_codes)
    .bind(&durations)
    .bind(&correlation_ids)
    .bind(&request_ids)
    .execute(pool)
    .await?;

    debug!(rows = result.rows_affected(), "Bulk-inserted application logs");

    Ok(result.rows_affected())
}
