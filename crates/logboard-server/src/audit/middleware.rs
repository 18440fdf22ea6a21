//! Audit capture middleware
//!
//! Tower layer recording one audit entry per HTTP request:
//! - every request is recorded with method, url, status, duration, client
//!   address, user agent, user and correlation identifiers
//! - request bodies are captured for commands (POST, PUT, PATCH, DELETE)
//!   and stored as the invocation parameters of the inferred action row
//! - entries are written on a spawned task after the response is produced,
//!   so auditing never blocks or fails the request path
//! - health and hub endpoints are excluded

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request},
    http::Method,
    response::Response,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::models::{NewAuditEntry, NewAuditEntryAction};
use super::queries::create_audit_entry;
use crate::hub::{HubState, AUDIT_GROUP};

/// Paths that never produce audit entries.
const EXCLUDED_PREFIXES: &[&str] = &["/health", "/hub"];

/// Audit capture layer
#[derive(Clone)]
pub struct AuditLayer {
    pool: PgPool,
    hub: HubState,
}

impl AuditLayer {
    /// Create a new audit layer with database pool and refresh hub
    pub fn new(pool: PgPool, hub: HubState) -> Self {
        Self { pool, hub }
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditMiddleware {
            inner,
            pool: self.pool.clone(),
            hub: self.hub.clone(),
        }
    }
}

/// Audit middleware service
#[derive(Clone)]
pub struct AuditMiddleware<S> {
    inner: S,
    pool: PgPool,
    hub: HubState,
}

impl<S> Service<Request> for AuditMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Display,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let mut inner = self.inner.clone();
        let pool = self.pool.clone();
        let hub = self.hub.clone();

        Box::pin(async move {
            let method = request.method().clone();
            let uri = request.uri().clone();
            let headers = request.headers().clone();

            if is_excluded(uri.path()) {
                return inner.call(request).await;
            }

            let client_ip = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string());

            let browser_info = headers
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            // Identity comes from gateway-injected headers; real token
            // parsing is the production follow-up.
            let user_id = headers
                .get("x-user-id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| Uuid::parse_str(s).ok());

            let user_name = headers
                .get("x-user-name")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            let correlation_id = headers
                .get("x-correlation-id")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            // Capture request bodies only for commands; queries carry their
            // parameters in the URL.
            let is_command =
                matches!(method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE);

            let (parts, body) = request.into_parts();
            let body_bytes = if is_command {
                match body.collect().await {
                    Ok(collected) => collected.to_bytes(),
                    Err(e) => {
                        warn!(
                            method = %method,
                            uri = %uri,
                            error = %e,
                            "Failed to capture request body"
                        );
                        Bytes::new()
                    },
                }
            } else {
                Bytes::new()
            };

            let request = Request::from_parts(parts, Body::from(body_bytes.clone()));

            let started = Instant::now();
            let execution_time = Utc::now();
            let response = inner.call(request).await?;
            let duration_ms = started.elapsed().as_millis() as i64;

            let status = response.status();
            let exception = if status.is_server_error() {
                Some(format!(
                    "HttpError: {} {} returned status {}",
                    method,
                    uri.path(),
                    status.as_u16()
                ))
            } else {
                None
            };

            let parameters = if body_bytes.is_empty() {
                None
            } else {
                serde_json::from_slice::<JsonValue>(&body_bytes).ok()
            };

            let (service_name, method_name) = infer_action(&method, uri.path());

            let entry = NewAuditEntry {
                user_id,
                user_name,
                execution_time,
                duration_ms,
                http_method: method.to_string(),
                url: uri.to_string(),
                http_status_code: Some(status.as_u16() as i32),
                client_ip,
                browser_info,
                correlation_id: Some(correlation_id),
                exception,
                actions: vec![NewAuditEntryAction {
                    service_name,
                    method_name,
                    parameters,
                    execution_time,
                    duration_ms,
                }],
            };

            // Fire and forget; a lost audit row must never fail the request.
            tokio::spawn(async move {
                match create_audit_entry(&pool, entry).await {
                    Ok(audit_id) => {
                        debug!(audit_id = %audit_id, "Audit entry recorded");
                        hub.notify(AUDIT_GROUP);
                    },
                    Err(e) => {
                        error!(error = %e, "Failed to record audit entry");
                    },
                }
            });

            Ok(response)
        })
    }
}

fn is_excluded(path: &str) -> bool {
    EXCLUDED_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Infer the logical service and method names from the request route.
///
/// `/api/v1/audit-analytics/dashboard` becomes ("audit-analytics",
/// "dashboard"); requests without a second segment fall back to the HTTP
/// method name.
fn infer_action(method: &Method, path: &str) -> (String, String) {
    let mut segments = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "api" && !is_version_segment(s));

    let service_name = segments
        .next()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "root".to_string());

    let method_name = segments
        .next()
        .map(|s| s.to_string())
        .unwrap_or_else(|| method.to_string().to_lowercase());

    (service_name, method_name)
}

fn is_version_segment(segment: &str) -> bool {
    segment.len() >= 2
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}
