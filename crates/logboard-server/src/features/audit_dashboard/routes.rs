//! Audit analytics routes
//!
//! # Route Structure
//!
//! - `GET|POST /api/v1/audit-analytics/dashboard` - aggregated dashboard
//! - `POST /api/v1/audit-analytics/search` - filtered search
//! - `POST /api/v1/audit-analytics/export` - CSV/JSON file download
//! - `GET /api/v1/audit-analytics/recent` - newest entries with skip/take
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

use super::export::ExportAuditLogsRequest;
use super::queries::{self, SearchAuditLogsRequest};
use crate::api::response::{ApiError, ApiResponse};
use crate::cache::DashboardCache;
use crate::features::shared::pagination::PageRequest;
use crate::features::shared::validation::{validate_range, DateRangeQuery};
use crate::features::FeatureState;
use crate::permissions::{Grants, Permission};

const DASHBOARD_CACHE_KIND: &str = "audit-dashboard";

/// Creates the audit analytics router with all routes configured
pub fn audit_analytics_routes() -> Router<FeatureState> {
    Router::new()
        .route("/dashboard", get(get_dashboard).post(post_dashboard))
        .route("/search", post(search_audit_logs))
        .route("/export", post(export_audit_logs))
        .route("/recent", get(recent_audit_logs))
}

/// Dashboard for a date range supplied as query parameters
#[tracing::instrument(skip(state, grants))]
async fn get_dashboard(
    State(state): State<FeatureState>,
    grants: Grants,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, ApiError> {
    grants.require(Permission::Dashboard)?;
    dashboard(state, query).await
}

/// Dashboard for a date range supplied in the request body
#[tracing::instrument(skip(state, grants))]
async fn post_dashboard(
    State(state): State<FeatureState>,
    grants: Grants,
    Json(query): Json<DateRangeQuery>,
) -> Result<Response, ApiError> {
    grants.require(Permission::Dashboard)?;
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
        tracing::debug!("Audit dashboard served from cache");
        return Ok(Json(ApiResponse::success(cached)).into_response());
    }

    let response = queries::get_dashboard::handle(state.db.clone(), range, state.analytics.top_n)
        .await
        .map_err(|e| match e {
            queries::AuditDashboardError::Database(err) => ApiError::Database(err),
        })?;

    let payload = serde_json::to_value(&response)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    state.cache.insert(key, payload.clone());

    Ok(Json(ApiResponse::success(payload)).into_response())
}

/// Filtered audit search with skip/take pagination
#[tracing::instrument(skip(state, grants, request))]
async fn search_audit_logs(
    State(state): State<FeatureState>,
    grants: Grants,
    Json(request): Json<SearchAuditLogsRequest>,
) -> Result<Response, ApiError> {
    grants.require(Permission::AuditView)?;

    let page = queries::search::handle(state.db.clone(), request).await?;

    tracing::debug!(
        count = page.items.len(),
        total = page.page.total_count,
        "Audit entries searched via API"
    );

    Ok(Json(ApiResponse::success(page)).into_response())
}

/// Render the filtered entries as a CSV or JSON file download
#[tracing::instrument(skip(state, grants, request))]
async fn export_audit_logs(
    State(state): State<FeatureState>,
    grants: Grants,
    Json(request): Json<ExportAuditLogsRequest>,
) -> Result<Response, ApiError> {
    grants.require(Permission::AuditExport)?;

    let file = super::export::handle(state.db.clone(), request, state.analytics.export_max_rows)
        .await?;

    tracing::info!(
        file_name = %file.file_name,
        bytes = file.bytes.len(),
        "Audit export rendered via API"
    );

    Ok(file.into_response())
}

/// Newest audit entries with skip/take
#[tracing::instrument(skip(state, grants))]
async fn recent_audit_logs(
    State(state): State<FeatureState>,
    grants: Grants,
    Query(page): Query<PageRequest>,
) -> Result<Response, ApiError> {
    grants.require(Permission::AuditView)?;

    let page = queries::recent::handle(state.db.clone(), page).await?;

    Ok(Json(ApiResponse::success(page)).into_response())
}
