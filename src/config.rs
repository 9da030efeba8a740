//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::RedisStoreConfig;
use crate::catalog::CatalogTtls;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Primary tier URL; `None` runs on the local tier alone
    pub redis_url: Option<String>,
    /// Prefix for every Redis key this process writes
    pub redis_key_namespace: String,
    /// Per-command Redis deadline in milliseconds
    pub redis_timeout_ms: u64,
    /// Redis connect deadline in milliseconds
    pub redis_connect_timeout_ms: u64,
    /// Fail-fast window after a failed Redis connect, in milliseconds
    pub redis_reconnect_backoff_ms: u64,
    /// Maximum number of entries the local tier can hold
    pub local_max_entries: usize,
    /// Cache TTL in seconds for route lists and details
    pub routes_cache_ttl: u64,
    /// Cache TTL in seconds for stop lists
    pub stops_cache_ttl: u64,
    /// Local tier sweep interval in seconds
    pub cleanup_interval: u64,
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    /// - `REDIS_URL` - Redis URL (default: unset, local tier only)
    /// - `REDIS_KEY_NAMESPACE` - Redis key prefix (default: "transit:")
    /// - `REDIS_TIMEOUT_MS` - Per-command deadline (default: 500)
    /// - `REDIS_CONNECT_TIMEOUT_MS` - Connect deadline (default: 2000)
    /// - `REDIS_RECONNECT_BACKOFF_MS` - Wait after a failed connect (default: 5000)
    /// - `LOCAL_MAX_ENTRIES` - Local tier capacity (default: 1000)
    /// - `ROUTES_CACHE_TTL` - Route cache TTL in seconds (default: 1800)
    /// - `STOPS_CACHE_TTL` - Stop cache TTL in seconds (default: 3600)
    /// - `CLEANUP_INTERVAL` - Local sweep frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_env("SERVER_PORT", defaults.server_port),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            redis_key_namespace: env::var("REDIS_KEY_NAMESPACE")
                .unwrap_or(defaults.redis_key_namespace),
            redis_timeout_ms: parse_env("REDIS_TIMEOUT_MS", defaults.redis_timeout_ms),
            redis_connect_timeout_ms: parse_env(
                "REDIS_CONNECT_TIMEOUT_MS",
                defaults.redis_connect_timeout_ms,
            ),
            redis_reconnect_backoff_ms: parse_env(
                "REDIS_RECONNECT_BACKOFF_MS",
                defaults.redis_reconnect_backoff_ms,
            ),
            local_max_entries: parse_env("LOCAL_MAX_ENTRIES", defaults.local_max_entries),
            routes_cache_ttl: parse_env("ROUTES_CACHE_TTL", defaults.routes_cache_ttl),
            stops_cache_ttl: parse_env("STOPS_CACHE_TTL", defaults.stops_cache_ttl),
            cleanup_interval: parse_env("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Redis tier settings, or `None` when no URL is configured.
    pub fn redis_store_config(&self) -> Option<RedisStoreConfig> {
        self.redis_url.as_ref().map(|url| RedisStoreConfig {
            url: url.clone(),
            namespace: self.redis_key_namespace.clone(),
            operation_timeout: Duration::from_millis(self.redis_timeout_ms),
            connect_timeout: Duration::from_millis(self.redis_connect_timeout_ms),
            reconnect_backoff: Duration::from_millis(self.redis_reconnect_backoff_ms),
            ..RedisStoreConfig::default()
        })
    }

    pub fn catalog_ttls(&self) -> CatalogTtls {
        CatalogTtls {
            routes: Duration::from_secs(self.routes_cache_ttl),
            stops: Duration::from_secs(self.stops_cache_ttl),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            redis_url: None,
            redis_key_namespace: "transit:".to_string(),
            redis_timeout_ms: 500,
            redis_connect_timeout_ms: 2000,
            redis_reconnect_backoff_ms: 5000,
            local_max_entries: 1000,
            routes_cache_ttl: 1800,
            stops_cache_ttl: 3600,
            cleanup_interval: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8000);
        assert!(config.redis_url.is_none());
        assert_eq!(config.local_max_entries, 1000);
        assert_eq!(config.cleanup_interval, 30);
        assert_eq!(config.catalog_ttls(), CatalogTtls::default());
    }

    #[test]
    fn test_redis_store_config() {
        let mut config = Config::default();
        assert!(config.redis_store_config().is_none());

        config.redis_url = Some("redis://cache:6379/2".to_string());
        config.redis_timeout_ms = 250;

        let redis = config.redis_store_config().unwrap();
        assert_eq!(redis.url, "redis://cache:6379/2");
        assert_eq!(redis.namespace, "transit:");
        assert_eq!(redis.operation_timeout, Duration::from_millis(250));
        assert_eq!(redis.connect_timeout, Duration::from_secs(2));
        assert_eq!(redis.reconnect_backoff, Duration::from_secs(5));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "SERVER_PORT",
            "REDIS_URL",
            "REDIS_KEY_NAMESPACE",
            "REDIS_TIMEOUT_MS",
            "REDIS_CONNECT_TIMEOUT_MS",
            "REDIS_RECONNECT_BACKOFF_MS",
            "LOCAL_MAX_ENTRIES",
            "ROUTES_CACHE_TTL",
            "STOPS_CACHE_TTL",
            "CLEANUP_INTERVAL",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 8000);
        assert!(config.redis_url.is_none());
        assert_eq!(config.redis_key_namespace, "transit:");
        assert_eq!(config.routes_cache_ttl, 1800);
        assert_eq!(config.stops_cache_ttl, 3600);
        assert_eq!(config.redis_reconnect_backoff_ms, 5000);
    }
}
