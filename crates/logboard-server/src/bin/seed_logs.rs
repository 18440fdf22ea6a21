//! Seed the app_logs table with demo data
//!
//! Inserts a spread of application-log rows over the last seven days using
//! the bulk UNNEST insert path, for exercising the dashboards locally.
//!
//! Usage: `seed_logs [count]` (default 1000), honoring DATABASE_URL.

use anyhow::Result;
use chrono::{Duration, Utc};
use logboard_common::logging::{init_logging, LogConfig};
use tracing::info;

use logboard_server::config::Config;
use logboard_server::db::{self, app_logs};
use logboard_server::models::{LogLevel, NewApplicationLog};

const BATCH_SIZE: usize = 500;

const APPLICATIONS: &[&str] = &["gateway", "billing", "inventory", "identity"];
const PATHS: &[&str] = &[
    "/api/v1/orders",
    "/api/v1/invoices",
    "/api/v1/items",
    "/api/v1/sessions",
];
const EXCEPTIONS: &[&str] = &[
    "IoError: connection refused\n  at pool.acquire\n  at handler",
    "Timeout: deadline exceeded after 30s",
    "ValidationError: quantity must be positive",
];

fn build_row(i: usize, now: chrono::DateTime<Utc>) -> NewApplicationLog {
    // Spread rows over the last week, weighted toward info-level traffic
    let level = match i % 20 {
        0 => LogLevel::Error,
        1 | 2 => LogLevel::Warning,
        3 => LogLevel::Debug,
        _ => LogLevel::Information,
    };

    let mut row = NewApplicationLog::event(
        level,
        match level {
            LogLevel::Error => "request failed".to_string(),
            LogLevel::Warning => "request was slow".to_string(),
            _ => "request handled".to_string(),
        },
    );

    row.timestamp = now - Duration::minutes((i * 7) as i64 % (7 * 24 * 60));
    row.application = Some(APPLICATIONS[i % APPLICATIONS.len()].to_string());
    row.http_method = Some(if i % 3 == 0 { "POST" } else { "GET" }.to_string());
    row.request_path = Some(PATHS[i % PATHS.len()].to_string());
    row.status_code = Some(match level {
        LogLevel::Error => 500,
        LogLevel::Warning => 200,
        _ => 200,
    });
    row.duration_ms = Some(((i * 37) % 900 + 3) as i64);
    row.correlation_id = Some(format!("seed-{:06}", i));

    if level == LogLevel::Error {
        row.exception = Some(EXCEPTIONS[i % EXCEPTIONS.len()].to_string());
    }

    row
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&LogConfig::default())?;

    let count: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    let config = Config::load()?;
    let pool = db::create_pool(&config.database).await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;

    let now = Utc::now();
    let mut inserted = 0u64;

    for batch_start in (0..count).step_by(BATCH_SIZE) {
        let batch: Vec<NewApplicationLog> = (batch_start..(batch_start + BATCH_SIZE).min(count))
            .map(|i| build_row(i, now))
            .collect();
        inserted += app_logs::insert_logs_bulk(&pool, &batch).await?;
    }

    info!(inserted, "Seeded application logs");

    Ok(())
}
