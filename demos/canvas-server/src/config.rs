//! Service configuration from environment variables.
//!
//! Every knob has a default suitable for local development; a
//! deployment overrides what it needs. Unset or empty variables fall
//! back silently, a deliberately forgiving posture for a demo service.

use std::env;

/// Runtime configuration for the canvas server.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// WebSocket listener address.
    pub ws_addr: String,
    /// HTTP (REST) listener address.
    pub http_addr: String,
    /// Redis connection URL.
    pub redis_url: String,
    /// Origins allowed by the HTTP CORS policy.
    pub allowed_origins: Vec<String>,
    /// Admin webhook URL; `None` disables admin notifications.
    pub admin_webhook: Option<String>,
}

impl ServiceConfig {
    /// Loads configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            ws_addr: var_or("BOXGRID_WS_ADDR", "0.0.0.0:8080"),
            http_addr: var_or("BOXGRID_HTTP_ADDR", "0.0.0.0:8000"),
            redis_url: var_or("BOXGRID_REDIS_URL", "redis://127.0.0.1/"),
            allowed_origins: var_or(
                "BOXGRID_ALLOWED_ORIGINS",
                "http://localhost:8000,http://localhost:5173",
            )
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect(),
            admin_webhook: env::var("BOXGRID_ADMIN_WEBHOOK")
                .ok()
                .filter(|url| !url.is_empty()),
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults_are_local_development() {
        // Tests run without BOXGRID_* set in CI; this doubles as a
        // check that unset variables fall back.
        let config = ServiceConfig::from_env();

        assert!(!config.ws_addr.is_empty());
        assert!(!config.http_addr.is_empty());
        assert!(config.redis_url.starts_with("redis://"));
        assert!(!config.allowed_origins.is_empty());
    }
}
