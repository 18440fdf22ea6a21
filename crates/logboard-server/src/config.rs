//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/logboard";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Widest date range a dashboard or search query may cover, in days.
pub const DEFAULT_MAX_RANGE_DAYS: i64 = 90;

/// Window applied when a request carries no date range, in hours.
pub const DEFAULT_RANGE_HOURS: i64 = 24;

/// How long cached dashboard payloads stay fresh, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 180;

/// Upper bound on rows rendered into a single export file.
pub const DEFAULT_EXPORT_MAX_ROWS: i64 = 10_000;

/// Number of entries in each dashboard top-N list.
pub const DEFAULT_TOP_N: i64 = 10;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub analytics: AnalyticsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Analytics tuning knobs shared by the dashboard and export features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Maximum date-range span accepted by dashboards and searches, in days
    pub max_range_days: i64,
    /// Default window when no range is supplied, in hours
    pub default_range_hours: i64,
    /// Dashboard cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// Maximum number of rows in one export file
    pub export_max_rows: i64,
    /// Size of dashboard top-N lists
    pub top_n: i64,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("LOGBOARD_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_parse("LOGBOARD_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_parse(
                    "LOGBOARD_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_parse(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_parse(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_parse(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_parse(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                allow_credentials: env_parse("CORS_ALLOW_CREDENTIALS", true),
            },
            analytics: AnalyticsConfig {
                max_range_days: env_parse("ANALYTICS_MAX_RANGE_DAYS", DEFAULT_MAX_RANGE_DAYS),
                default_range_hours: env_parse("ANALYTICS_DEFAULT_RANGE_HOURS", DEFAULT_RANGE_HOURS),
                cache_ttl_secs: env_parse("ANALYTICS_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
                export_max_rows: env_parse("ANALYTICS_EXPORT_MAX_ROWS", DEFAULT_EXPORT_MAX_ROWS),
                top_n: env_parse("ANALYTICS_TOP_N", DEFAULT_TOP_N),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.analytics.max_range_days < 1 {
            anyhow::bail!("Analytics max_range_days must be at least 1");
        }

        if self.analytics.default_range_hours < 1 {
            anyhow::bail!("Analytics default_range_hours must be at least 1");
        }

        if self.analytics.export_max_rows < 1 {
            anyhow::bail!("Analytics export_max_rows must be at least 1");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
            default_range_hours: DEFAULT_RANGE_HOURS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            export_max_rows: DEFAULT_EXPORT_MAX_ROWS,
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pool_bounds_rejected() {
        let mut config = Config::default();
        config.database.min_connections = 50;
        config.database.max_connections = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_analytics_bounds_rejected() {
        let mut config = Config::default();
        config.analytics.max_range_days = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analytics.export_max_rows = 0;
        assert!(config.validate().is_err());
    }
}
