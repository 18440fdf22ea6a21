//! Logboard Server - Main entry point

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use logboard_common::logging::{init_logging_with, LogConfig};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;
use tracing_subscriber::Layer as _;

use logboard_server::{
    audit, cache::DashboardCache, config::Config, db, features, hub,
    middleware::{self, rate_limit::RateLimitConfig},
    persist,
};

/// Application state shared across top-level handlers
#[derive(Clone)]
struct AppState {
    db: sqlx::PgPool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // The persistence layer is attached before the pool exists; its writer
    // task picks up the receiving end once the database is reachable.
    let (persist_layer, persist_rx) = persist::PersistLayer::channel(1024);

    let log_config = LogConfig::builder()
        .log_file_prefix("logboard-server".to_string())
        .filter_directives("logboard_server=debug,tower_http=debug,sqlx=warn".to_string())
        .build();

    // Environment variables take precedence over the built-in defaults
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging_with(&log_config, vec![persist_layer.boxed()])?;

    info!("Starting Logboard Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&config.database).await?;
    info!("Database connection pool established");

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    info!("Database migrations completed");

    // Refresh hub and log persistence writer
    let hub_state = hub::HubState::new();
    let _writer_handle = persist::spawn_writer(db_pool.clone(), persist_rx, hub_state.clone());
    info!("Log persistence writer started");

    // Dashboard cache with periodic sweep
    let cache = Arc::new(DashboardCache::new(Duration::from_secs(
        config.analytics.cache_ttl_secs,
    )));
    let sweep_cache = cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sweep_cache.sweep();
        }
    });

    let state = AppState {
        db: db_pool.clone(),
    };

    let feature_state = features::FeatureState {
        db: db_pool.clone(),
        cache,
        analytics: config.analytics.clone(),
    };

    let app = create_router(state, feature_state, hub_state.clone(), &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
    .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(
    state: AppState,
    feature_state: features::FeatureState,
    hub_state: hub::HubState,
    config: &Config,
) -> Router {
    let feature_routes = features::router(feature_state);

    let hub_routes = Router::new()
        .route("/log-analytics", get(hub::ws_handler))
        .with_state(hub_state.clone());

    // Layers apply from innermost to outermost
    Router::new()
        .route("/health", get(health_check))
        .with_state(state.clone())
        .nest("/api/v1", feature_routes)
        .nest("/hub", hub_routes)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
        .layer(middleware::rate_limit::rate_limit_layer(
            RateLimitConfig::from_env(),
        ))
        .layer(audit::AuditLayer::new(state.db.clone(), hub_state))
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> Result<Response, StatusCode> {
    match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give ongoing requests time to complete
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
