//! Database queries for audit entries

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::models::{
    AuditEntry, AuditEntryAction, AuditFilter, NewAuditEntry, DEFAULT_AUDIT_QUERY_LIMIT,
    MAX_AUDIT_QUERY_LIMIT,
};
use crate::error::ServerResult;

const ENTRY_COLUMNS: &str = "id, user_id, user_name, execution_time, duration_ms, http_method, \
                             url, http_status_code, client_ip, browser_info, correlation_id, \
                             exception";

/// Record one audit entry together with its nested action rows.
///
/// The entry and its actions are written in a single transaction so an audit
/// record is never visible without its actions.
pub async fn create_audit_entry(pool: &PgPool, entry: NewAuditEntry) -> ServerResult<Uuid> {
    let mut tx = pool.begin().await?;

    let entry_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO audit_logs (
            user_id, user_name, execution_time, duration_ms, http_method,
            url, http_status_code, client_ip, browser_info, correlation_id, exception
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(entry.user_id)
    .bind(&entry.user_name)
    .bind(entry.execution_time)
    .bind(entry.duration_ms)
    .bind(&entry.http_method)
    .bind(&entry.url)
    .bind(entry.http_status_code)
    .bind(&entry.client_ip)
    .bind(&entry.browser_info)
    .bind(&entry.correlation_id)
    .bind(&entry.exception)
    .fetch_one(&mut *tx)
    .await?;

    for action in &entry.actions {
        sqlx::query(
            r#"
            INSERT INTO audit_log_actions (
                audit_log_id, service_name, method_name, parameters,
                execution_time, duration_ms
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry_id)
        .bind(&action.service_name)
        .bind(&action.method_name)
        .bind(&action.parameters)
        .bind(action.execution_time)
        .bind(action.duration_ms)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    debug!(
        audit_id = %entry_id,
        method = %entry.http_method,
        url = %entry.url,
        actions = entry.actions.len(),
        "Created audit entry"
    );

    Ok(entry_id)
}

fn filter_conditions(filter: &AuditFilter) -> (String, u32) {
    let mut sql = String::new();
    let mut n = 1;

    if filter.user_id.is_some() {
        sql.push_str(&format!(" AND user_id = ${}", n));
        n += 1;
    }
    if filter.http_method.is_some() {
        sql.push_str(&format!(" AND http_method = ${}", n));
        n += 1;
    }
    if filter.url_contains.is_some() {
        sql.push_str(&format!(" AND LOWER(url) LIKE ${}", n));
        n += 1;
    }
    if filter.min_status_code.is_some() {
        sql.push_str(&format!(" AND http_status_code >= ${}", n));
        n += 1;
    }
    if filter.max_status_code.is_some() {
        sql.push_str(&format!(" AND http_status_code <= ${}", n));
        n += 1;
    }
    if filter.start_time.is_some() {
        sql.push_str(&format!(" AND execution_time >= ${}", n));
        n += 1;
    }
    if filter.end_time.is_some() {
        sql.push_str(&format!(" AND execution_time <= ${}", n));
        n += 1;
    }
    match filter.has_exception {
        Some(true) => sql.push_str(" AND exception IS NOT NULL"),
        Some(false) => sql.push_str(" AND exception IS NULL"),
        None => {},
    }

    (sql, n)
}

macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {{
        let mut q = $query;
        if let Some(user_id) = $filter.user_id {
            q = q.bind(user_id);
        }
        if let Some(ref http_method) = $filter.http_method {
            q = q.bind(http_method.clone());
        }
        if let Some(ref url_contains) = $filter.url_contains {
            q = q.bind(format!("%{}%", url_contains.to_lowercase()));
        }
        if let Some(min_status) = $filter.min_status_code {
            q = q.bind(min_status);
        }
        if let Some(max_status) = $filter.max_status_code {
            q = q.bind(max_status);
        }
        if let Some(start) = $filter.start_time {
            q = q.bind(start);
        }
        if let Some(end) = $filter.end_time {
            q = q.bind(end);
        }
        q
    }};
}

/// Search audit entries with optional filters and skip/take pagination.
///
/// Returns the page of entries (newest first) and the total matching
/// count. Callers bound `take`: API paths clamp it to the page-size
/// maximum, the export path to the configured export cap.
pub async fn search_audit_entries(
    pool: &PgPool,
    filter: &AuditFilter,
    skip: i64,
    take: i64,
) -> ServerResult<(Vec<AuditEntry>, i64)> {
    let (conditions, _) = filter_conditions(filter);

    let count_sql = format!("SELECT COUNT(*) FROM audit_logs WHERE 1=1{}", conditions);
    let total: i64 = bind_filter!(sqlx::query_scalar(&count_sql), filter)
        .fetch_one(pool)
        .await?;

    let page_sql = format!(
        "SELECT {} FROM audit_logs WHERE 1=1{} ORDER BY execution_time DESC LIMIT {} OFFSET {}",
        ENTRY_COLUMNS, conditions, take, skip
    );
    let entries = bind_filter!(sqlx::query_as::<_, AuditEntry>(&page_sql), filter)
        .fetch_all(pool)
        .await?;

    debug!(count = entries.len(), total, "Searched audit entries");

    Ok((entries, total))
}

/// Fetch the newest audit entries with skip/take.
pub async fn recent_audit_entries(
    pool: &PgPool,
    skip: i64,
    take: i64,
) -> ServerResult<Vec<AuditEntry>> {
    let take = take.min(MAX_AUDIT_QUERY_LIMIT);

    let sql = format!(
        "SELECT {} FROM audit_logs ORDER BY execution_time DESC LIMIT $1 OFFSET $2",
        ENTRY_COLUMNS
    );
    let entries = sqlx::query_as::<_, AuditEntry>(&sql)
        .bind(take)
        .bind(skip)
        .fetch_all(pool)
        .await?;

    Ok(entries)
}

/// Get recent audit entries for a specific user.
pub async fn get_user_audit_entries(
    pool: &PgPool,
    user_id: Uuid,
    limit: Option<i64>,
) -> ServerResult<Vec<AuditEntry>> {
    let limit = limit.unwrap_or(DEFAULT_AUDIT_QUERY_LIMIT).min(MAX_AUDIT_QUERY_LIMIT);

    let sql = format!(
        "SELECT {} FROM audit_logs WHERE user_id = $1 ORDER BY execution_time DESC LIMIT $2",
        ENTRY_COLUMNS
    );
    let entries = sqlx::query_as::<_, AuditEntry>(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    debug!(user_id = %user_id, count = entries.len(), "Retrieved user audit entries");

    Ok(entries)
}

/// Fetch the action rows nested under one audit entry.
pub async fn get_entry_actions(
    pool: &PgPool,
    audit_log_id: Uuid,
) -> ServerResult<Vec<AuditEntryAction>> {
    let actions = sqlx::query_as::<_, AuditEntryAction>(
        r#"
        SELECT id, audit_log_id, service_name, method_name, parameters,
               execution_time, duration_ms
        FROM audit_log_actions
        WHERE audit_log_id = $1
        ORDER BY execution_time
        "#,
    )
    .bind(audit_log_id)
    .fetch_all(pool)
    .await?;

    Ok(actions)
}

/// Total number of stored audit entries.
pub async fn total_count(pool: &PgPool) -> ServerResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of failed requests (exception recorded) since the given instant.
pub async fn failure_count_since(pool: &PgPool, since: DateTime<Utc>) -> ServerResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_logs WHERE exception IS NOT NULL AND execution_time >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::models::NewAuditEntryAction;
    use serde_json::json;

    fn sample_entry(method: &str, url: &str, status: i32) -> NewAuditEntry {
        NewAuditEntry {
            user_id: None,
            user_name: None,
            execution_time: Utc::now(),
            duration_ms: 5,
            http_method: method.to_string(),
            url: url.to_string(),
            http_status_code: Some(status),
            client_ip: Some("127.0.0.1".to_string()),
            browser_info: None,
            correlation_id: None,
            exception: None,
            actions: vec![],
        }
    }

    #[test]
    fn test_filter_conditions_numbering() {
        let filter = AuditFilter {
            http_method: Some("POST".to_string()),
            min_status_code: Some(400),
            has_exception: Some(true),
            ..Default::default()
        };
        let (sql, next) = filter_conditions(&filter);
        assert!(sql.contains("http_method = $1"));
        assert!(sql.contains("http_status_code >= $2"));
        assert!(sql.contains("exception IS NOT NULL"));
        assert_eq!(next, 3);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_entry_with_actions(pool: PgPool) -> ServerResult<()> {
        let mut entry = sample_entry("POST", "/api/v1/log-analytics/search", 200);
        entry.user_id = Some(Uuid::new_v4());
        entry.actions.push(NewAuditEntryAction {
            service_name: "log-analytics".to_string(),
            method_name: "search".to_string(),
            parameters: Some(json!({"take": 50})),
            execution_time: Utc::now(),
            duration_ms: 4,
        });

        let id = create_audit_entry(&pool, entry).await?;

        let actions = get_entry_actions(&pool, id).await?;
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].service_name, "log-analytics");
        assert_eq!(actions[0].method_name, "search");

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_search_filters_by_status_range(pool: PgPool) -> ServerResult<()> {
        create_audit_entry(&pool, sample_entry("GET", "/api/v1/health", 200)).await?;
        create_audit_entry(&pool, sample_entry("GET", "/api/v1/missing", 404)).await?;
        create_audit_entry(&pool, sample_entry("POST", "/api/v1/boom", 500)).await?;

        let filter = AuditFilter {
            min_status_code: Some(400),
            max_status_code: Some(499),
            ..Default::default()
        };
        let (entries, total) = search_audit_entries(&pool, &filter, 0, 50).await?;

        assert_eq!(total, 1);
        assert_eq!(entries[0].http_status_code, Some(404));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_search_pagination_counts(pool: PgPool) -> ServerResult<()> {
        for i in 0..7 {
            create_audit_entry(&pool, sample_entry("GET", &format!("/api/v1/page/{}", i), 200))
                .await?;
        }

        let filter = AuditFilter::default();
        let (page, total) = search_audit_entries(&pool, &filter, 5, 5).await?;

        assert_eq!(total, 7);
        assert_eq!(page.len(), 2);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_user_audit_entries(pool: PgPool) -> ServerResult<()> {
        let user_id = Uuid::new_v4();
        for _ in 0..3 {
            let mut entry = sample_entry("GET", "/api/v1/log-analytics/recent", 200);
            entry.user_id = Some(user_id);
            create_audit_entry(&pool, entry).await?;
        }
        create_audit_entry(&pool, sample_entry("GET", "/api/v1/health", 200)).await?;

        let entries = get_user_audit_entries(&pool, user_id, None).await?;
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.user_id == Some(user_id)));

        Ok(())
    }
}
