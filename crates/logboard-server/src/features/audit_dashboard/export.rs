//! Audit export rendering
//!
//! Renders filtered audit entries into a CSV or JSON file download. Row
//! counts are bounded by the configured export cap; unknown formats fall
//! back to CSV.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::models::{AuditEntry, AuditFilter};
use crate::audit::queries::search_audit_entries;
use crate::error::ServerResult;
use crate::features::shared::csv;
use crate::features::shared::export::{ExportFile, ExportFormat};
use crate::features::shared::stats::first_line;

const CSV_HEADER: &[&str] = &[
    "id",
    "execution_time",
    "user_name",
    "http_method",
    "url",
    "http_status_code",
    "duration_ms",
    "client_ip",
    "correlation_id",
    "exception",
];

/// Export request: the search filter plus a format field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportAuditLogsRequest {
    #[serde(flatten)]
    pub filter: AuditFilter,
    /// "csv" or "json"; anything else silently becomes CSV
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[tracing::instrument(skip(pool, request))]
pub async fn handle(
    pool: PgPool,
    request: ExportAuditLogsRequest,
    max_rows: i64,
) -> ServerResult<ExportFile> {
    let format = ExportFormat::parse_or_default(request.format.as_deref());

    let (entries, total) = search_audit_entries(&pool, &request.filter, 0, max_rows).await?;
    if total > entries.len() as i64 {
        tracing::warn!(
            total,
            exported = entries.len(),
            "Audit export truncated to the configured row cap"
        );
    }

    let bytes = match format {
        ExportFormat::Csv => render_csv(&entries).into_bytes(),
        ExportFormat::Json => serde_json::to_vec_pretty(&entries)
            .map_err(logboard_common::LogboardError::from)?,
    };

    Ok(ExportFile {
        format,
        file_name: format.file_name("audit-logs", Utc::now()),
        bytes,
    })
}

fn render_csv(entries: &[AuditEntry]) -> String {
    let rows = entries
        .iter()
        .map(|entry| {
            vec![
                entry.id.to_string(),
                entry.execution_time.to_rfc3339(),
                entry.user_name.clone().unwrap_or_default(),
                entry.http_method.clone(),
                entry.url.clone(),
                entry
                    .http_status_code
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                entry.duration_ms.to_string(),
                entry.client_ip.clone().unwrap_or_default(),
                entry.correlation_id.clone().unwrap_or_default(),
                entry
                    .exception
                    .as_deref()
                    .map(first_line)
                    .unwrap_or_default()
                    .to_string(),
            ]
        })
        .collect();

    csv::render_document(CSV_HEADER, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(exception: Option<&str>) -> AuditEntry {
        AuditEntry {
            id: Uuid::new_v4(),
            user_id: None,
            user_name: Some("operator".to_string()),
            execution_time: Utc::now(),
            duration_ms: 12,
            http_method: "POST".to_string(),
            url: "/api/v1/audit-analytics/search?x=1,2".to_string(),
            http_status_code: Some(200),
            client_ip: Some("10.0.0.1".to_string()),
            correlation_id: None,
            browser_info: None,
            exception: exception.map(|e| e.to_string()),
        }
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let doc = render_csv(&[entry(None), entry(None)]);
        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,execution_time"));
    }

    #[test]
    fn test_csv_escapes_commas_and_newlines() {
        let doc = render_csv(&[entry(Some("Error: a,b\nstack frame"))]);
        let data_line = doc.lines().nth(1).unwrap();
        // The comma-bearing URL and exception are quoted, the newline gone
        assert!(data_line.contains("\"/api/v1/audit-analytics/search?x=1,2\""));
        assert!(data_line.contains("\"Error: a,b\""));
        assert_eq!(doc.lines().count(), 2);
    }

    #[test]
    fn test_unknown_format_defaults_to_csv() {
        let request = ExportAuditLogsRequest {
            filter: AuditFilter::default(),
            format: Some("parquet".to_string()),
        };
        let format = ExportFormat::parse_or_default(request.format.as_deref());
        assert_eq!(format, ExportFormat::Csv);
    }
}
