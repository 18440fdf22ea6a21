//! Filtered application-log search

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::app_logs::{search_logs, LogFilter};
use crate::error::ServerResult;
use crate::features::shared::pagination::{Paged, PageRequest};
use crate::models::{ApplicationLog, LogLevel};

/// Search request: optional predicates plus skip/take pagination.
///
/// Levels are accepted by name ("warning") and translated to the stored
/// level codes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchLogsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_exception: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub page: PageRequest,
}

impl SearchLogsRequest {
    pub(crate) fn filter(&self) -> LogFilter {
        LogFilter {
            min_level: self.min_level.map(|l| l.as_i16()),
            max_level: self.max_level.map(|l| l.as_i16()),
            message_contains: self.message_contains.clone(),
            application: self.application.clone(),
            has_exception: self.has_exception,
            correlation_id: self.correlation_id.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

#[tracing::instrument(skip(pool, request))]
pub async fn handle(
    pool: PgPool,
    request: SearchLogsRequest,
) -> ServerResult<Paged<ApplicationLog>> {
    let filter = request.filter();
    let (rows, total) = search_logs(&pool, &filter, request.page.skip(), request.page.take()).await?;

    Ok(Paged::from_items(rows, &request.page, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::app_logs::insert_logs_bulk;
    use crate::models::NewApplicationLog;

    #[test]
    fn test_request_accepts_level_names() {
        let request: SearchLogsRequest = serde_json::from_str(
            r#"{"min_level":"warning","message_contains":"timeout","take":10}"#,
        )
        .unwrap();

        assert_eq!(request.min_level, Some(LogLevel::Warning));
        let filter = request.filter();
        assert_eq!(filter.min_level, Some(3));
        assert_eq!(filter.message_contains.as_deref(), Some("timeout"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_search_by_application(pool: PgPool) -> ServerResult<()> {
        let mut rows = vec![
            NewApplicationLog::event(LogLevel::Information, "gateway up"),
            NewApplicationLog::event(LogLevel::Information, "worker up"),
        ];
        rows[0].application = Some("gateway".to_string());
        rows[1].application = Some("worker".to_string());
        insert_logs_bulk(&pool, &rows).await?;

        let request = SearchLogsRequest {
            application: Some("gateway".to_string()),
            ..Default::default()
        };
        let page = handle(pool, request).await?;

        assert_eq!(page.page.total_count, 1);
        assert_eq!(page.items[0].message, "gateway up");

        Ok(())
    }
}
