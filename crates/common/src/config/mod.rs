//! Configuration management for Citegraph services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Upstream OpenAlex API configuration
    #[serde(default)]
    pub openalex: OpenAlexConfig,

    /// Cache staleness policy
    #[serde(default)]
    pub cache: CacheConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Inbound rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Echo SQL statements through tracing
    #[serde(default)]
    pub sql_logging: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAlexConfig {
    /// Base URL of the OpenAlex API
    #[serde(default = "default_openalex_url")]
    pub api_url: String,

    /// Contact email sent in the user agent (polite pool)
    pub email: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_openalex_timeout")]
    pub timeout_secs: u64,

    /// Maximum upstream calls per window
    #[serde(default = "default_rate_limit_calls")]
    pub rate_limit_calls: usize,

    /// Window length in seconds
    #[serde(default = "default_rate_limit_period")]
    pub rate_limit_period_secs: u64,

    /// Page size used when the caller does not pick one
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Hard ceiling on the page size sent upstream
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Neighbors fetched per hop when expanding the citation graph
    #[serde(default = "default_neighbor_limit")]
    pub neighbor_limit: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Days a cached paper or author stays fresh
    #[serde(default = "default_cache_ttl_days")]
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second accepted by the gateway
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_database_url() -> String { "sqlite://research_graph.db?mode=rwc".to_string() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_openalex_url() -> String { "https://api.openalex.org".to_string() }
fn default_openalex_timeout() -> u64 { 10 }
fn default_rate_limit_calls() -> usize { 10 }
fn default_rate_limit_period() -> u64 { 1 }
fn default_page_size() -> u32 { 20 }
fn default_max_page_size() -> u32 { 100 }
fn default_neighbor_limit() -> u32 { 50 }
fn default_cache_ttl_days() -> i64 { 30 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "citegraph".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__OPENALEX__EMAIL=me@example.org
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file plus the `APP__` environment overlay
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database.read_url.as_deref().unwrap_or(&self.database.url)
    }
}

impl OpenAlexConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rate_limit_period(&self) -> Duration {
        Duration::from_secs(self.rate_limit_period_secs)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.ttl_days)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            read_url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            sql_logging: false,
        }
    }
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            api_url: default_openalex_url(),
            email: None,
            timeout_secs: default_openalex_timeout(),
            rate_limit_calls: default_rate_limit_calls(),
            rate_limit_period_secs: default_rate_limit_period(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            neighbor_limit: default_neighbor_limit(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_days: default_cache_ttl_days() }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            openalex: OpenAlexConfig::default(),
            cache: CacheConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.openalex.api_url, "https://api.openalex.org");
        assert_eq!(config.openalex.rate_limit_calls, 10);
        assert_eq!(config.openalex.max_page_size, 100);
        assert_eq!(config.openalex.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_cache_ttl_is_thirty_days() {
        let config = AppConfig::default();
        assert_eq!(config.cache.ttl(), chrono::Duration::days(30));
    }

    #[test]
    fn test_read_database_fallback() {
        let mut config = AppConfig::default();
        assert_eq!(config.read_database_url(), "sqlite://research_graph.db?mode=rwc");

        config.database.read_url = Some("postgres://replica/citegraph".to_string());
        assert_eq!(config.read_database_url(), "postgres://replica/citegraph");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                "[openalex]\nemail = \"ops@example.org\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.openalex.email.as_deref(), Some("ops@example.org"));
        assert_eq!(config.openalex.neighbor_limit, 50);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("citegraph-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[server]\nport = 8081\nrequest_timeout_secs = 5\n").unwrap();

        let config = AppConfig::from_file(&path.to_string_lossy()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_missing_file_fails() {
        assert!(AppConfig::from_file("/nonexistent/citegraph.toml").is_err());
    }
}
