//! Rate limiting middleware using tower-governor

use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor, GovernorLayer};

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per minute allowed
    pub requests_per_minute: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 120,
        }
    }
}

impl RateLimitConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            requests_per_minute: std::env::var("RATE_LIMIT_REQUESTS_PER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
        }
    }
}

/// Create rate limiting layer from configuration
pub fn rate_limit_layer(
    config: RateLimitConfig,
) -> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware> {
    // Replenish one request every 60_000ms / rpm, with a burst the size of
    // one full minute's budget.
    let replenishment_ms = 60_000 / config.requests_per_minute.max(1);
    let burst_size = config.requests_per_minute.try_into().unwrap_or(120);

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenishment_ms)
            .burst_size(burst_size)
            .finish()
            .unwrap(),
    );

    GovernorLayer {
        config: governor_conf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_config_default() {
        let config = RateLimitConfig::default();
        assert_eq!(config.requests_per_minute, 120);
    }

    #[test]
    fn test_rate_limit_layer_creation() {
        let config = RateLimitConfig {
            requests_per_minute: 60,
        };
        let _layer = rate_limit_layer(config);
    }
}
