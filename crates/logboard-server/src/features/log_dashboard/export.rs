//! Application-log export rendering

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::queries::search::SearchLogsRequest;
use crate::db::app_logs::search_logs;
use crate::error::ServerResult;
use crate::features::shared::csv;
use crate::features::shared::export::{ExportFile, ExportFormat};
use crate::features::shared::stats::first_line;
use crate::models::ApplicationLog;

const CSV_HEADER: &[&str] = &[
    "id",
    "timestamp",
    "level",
    "message",
    "application",
    "exception",
    "http_method",
    "request_path",
    "status_code",
    "duration_ms",
    "correlation_id",
];

/// Export request: the search filter plus a format field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportLogsRequest {
    #[serde(flatten)]
    pub search: SearchLogsRequest,
    /// "csv" or "json"; anything else silently becomes CSV
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[tracing::instrument(skip(pool, request))]
pub async fn handle(
    pool: PgPool,
    request: ExportLogsRequest,
    max_rows: i64,
) -> ServerResult<ExportFile> {
    let format = ExportFormat::parse_or_default(request.format.as_deref());
    let filter = request.search.filter();

    let (rows, total) = search_logs(&pool, &filter, 0, max_rows).await?;
    if total > rows.len() as i64 {
        tracing::warn!(
            total,
            exported = rows.len(),
            "Log export truncated to the configured row cap"
        );
    }

    let bytes = match format {
        ExportFormat::Csv => render_csv(&rows).into_bytes(),
        ExportFormat::Json => serde_json::to_vec_pretty(&rows)
            .map_err(logboard_common::LogboardError::from)?,
    };

    Ok(ExportFile {
        format,
        file_name: format.file_name("app-logs", Utc::now()),
        bytes,
    })
}

fn render_csv(rows: &[ApplicationLog]) -> String {
    let data = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.timestamp.to_rfc3339(),
                row.level().as_str().to_string(),
                row.message.clone(),
                row.application.clone().unwrap_or_default(),
                row.exception
                    .as_deref()
                    .map(first_line)
                    .unwrap_or_default()
                    .to_string(),
                row.http_method.clone().unwrap_or_default(),
                row.request_path.clone().unwrap_or_default(),
                row.status_code.map(|s| s.to_string()).unwrap_or_default(),
                row.duration_ms.map(|d| d.to_string()).unwrap_or_default(),
                row.correlation_id.clone().unwrap_or_default(),
            ]
        })
        .collect();

    csv::render_document(CSV_HEADER, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogLevel;
    use uuid::Uuid;

    fn row(message: &str) -> ApplicationLog {
        ApplicationLog {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level: LogLevel::Warning.as_i16(),
            message: message.to_string(),
            exception: None,
            application: Some("gateway".to_string()),
            http_method: None,
            request_path: None,
            status_code: None,
            duration_ms: None,
            correlation_id: None,
            request_id: None,
        }
    }

    #[test]
    fn test_csv_renders_level_names() {
        let doc = render_csv(&[row("slow request")]);
        let data_line = doc.lines().nth(1).unwrap();
        assert!(data_line.contains(",warning,"));
        assert!(data_line.contains("slow request"));
    }

    #[test]
    fn test_csv_quotes_messages_with_commas() {
        let doc = render_csv(&[row("a,b and \"c\"")]);
        let data_line = doc.lines().nth(1).unwrap();
        assert!(data_line.contains(r#""a,b and ""c""""#));
    }

    #[test]
    fn test_export_request_flattens_search_fields() {
        let request: ExportLogsRequest = serde_json::from_str(
            r#"{"min_level":"error","format":"json","take":5}"#,
        )
        .unwrap();

        assert_eq!(request.search.min_level, Some(LogLevel::Error));
        assert_eq!(
            ExportFormat::parse_or_default(request.format.as_deref()),
            ExportFormat::Json
        );
    }
}
