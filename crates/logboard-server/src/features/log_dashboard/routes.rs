//! Application-log analytics routes
//!
//! # Route Structure
//!
//! - `GET|POST /api/v1/log-analytics/dashboard` - aggregated dashboard
//! - `POST /api/v1/log-analytics/search` - filtered search
//! - `POST /api/v1/log-analytics/export` - CSV/JSON file download
//! - `GET /api/v1/log-analytics/recent` - newest logs with skip/take
//! - `GET /api/v1/log-analytics/applications` - distinct application names
//! - `GET /api/v1/log-analytics/health` - system health
//!
//! Dashboard responses are cached for a few minutes keyed by the rounded
//! date range.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use super::export::ExportLogsRequest;
use super::queries::{self, SearchLogsRequest};
use crate::api::response::{ApiError, ApiResponse};
use crate::cache::DashboardCache;
use crate::features::shared::pagination::PageRequest;
use crate::features::shared::validation::{validate_range, DateRangeQuery};
use crate::features::FeatureState;
use crate::permissions::{Grants, Permission};

const DASHBOARD_CACHE_KIND: &str = "log-dashboard";

/// Creates the application-log analytics router with all routes configured
pub fn log_analytics_routes() -> Router<FeatureState> {
    Router::new()
        .route("/dashboard", get(get_dashboard).post(post_dashboard))
        .route("/search", post(search_logs))
        .route("/export", post(export_logs))
        .route("/recent", get(recent_logs))
        .route("/applications", get(list_applications))
        .route("/health", get(system_health))
}

/// Dashboard for a date range supplied as query parameters
#[tracing::instrument(skip(state, grants))]
async fn get_dashboard(
    State(state): State<FeatureState>,
    grants: Grants,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, ApiError> {
    grants.require(Permission::AppDashboard)?;
    dashboard(state, query).await
}

/// Dashboard for a date range supplied in the request body
#[tracing::instrument(skip(state, grants))]
async fn post_dashboard(
    State(state): State<FeatureState>,
    grants: Grants,
    Json(query): Json<DateRangeQuery>,
) -> Result<Response, ApiError> {
    grants.require(Permission::AppDashboard)?;
    dashboard(state, query).await
}

async fn dashboard(state: FeatureState, query: DateRangeQuery) -> Result<Response, ApiError> {
    let range = validate_range(
        query,
        Utc::now(),
        state.analytics.max_range_days,
        state.analytics.default_range_hours,
    );

    let key = DashboardCache::key(DASHBOARD_CACHE_KIND, range.start, range.end);
    if let Some(cached) = state.cache.get(&key) {
        tracing::debug!("Log dashboard served from cache");
        return Ok(Json(ApiResponse::success(cached)).into_response());
    }

    let response = queries::get_dashboard::handle(state.db.clone(), range, state.analytics.top_n)
        .await
        .map_err(|e| match e {
            queries::LogDashboardError::Database(err) => ApiError::Database(err),
        })?;

    let payload = serde_json::to_value(&response)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    state.cache.insert(key, payload.clone());

    Ok(Json(ApiResponse::success(payload)).into_response())
}

/// Filtered log search with skip/take pagination
#[tracing::instrument(skip(state, grants, request))]
async fn search_logs(
    State(state): State<FeatureState>,
    grants: Grants,
    Json(request): Json<SearchLogsRequest>,
) -> Result<Response, ApiError> {
    grants.require(Permission::SearchLogs)?;

    let page = queries::search::handle(state.db.clone(), request).await?;

    tracing::debug!(
        count = page.items.len(),
        total = page.page.total_count,
        "Application logs searched via API"
    );

    Ok(Json(ApiResponse::success(page)).into_response())
}

/// Render the filtered logs as a CSV or JSON file download
#[tracing::instrument(skip(state, grants, request))]
async fn export_logs(
    State(state): State<FeatureState>,
    grants: Grants,
    Json(request): Json<ExportLogsRequest>,
) -> Result<Response, ApiError> {
    grants.require(Permission::ExportLogs)?;

    let file = super::export::handle(state.db.clone(), request, state.analytics.export_max_rows)
        .await?;

    tracing::info!(
        file_name = %file.file_name,
        bytes = file.bytes.len(),
        "Log export rendered via API"
    );

    Ok(file.into_response())
}

/// Newest application logs with skip/take
#[tracing::instrument(skip(state, grants))]
async fn recent_logs(
    State(state): State<FeatureState>,
    grants: Grants,
    Query(page): Query<PageRequest>,
) -> Result<Response, ApiError> {
    grants.require(Permission::ViewLogs)?;

    let page = queries::recent::handle(state.db.clone(), page).await?;

    Ok(Json(ApiResponse::success(page)).into_response())
}

/// Distinct application names observed in logs and audit actions
#[tracing::instrument(skip(state, grants))]
async fn list_applications(
    State(state): State<FeatureState>,
    grants: Grants,
) -> Result<Response, ApiError> {
    grants.require(Permission::ViewLogs)?;

    let applications = queries::applications::handle(state.db.clone()).await?;

    Ok(Json(ApiResponse::success(applications)).into_response())
}

/// Database connectivity, table sizes, and error activity
#[tracing::instrument(skip(state, grants))]
async fn system_health(
    State(state): State<FeatureState>,
    grants: Grants,
) -> Result<Response, ApiError> {
    grants.require(Permission::ViewLogs)?;

    let health = queries::system_health::handle(state.db.clone()).await?;

    Ok(Json(ApiResponse::success(health)).into_response())
}
