use std::path::PathBuf;
use std::time::Duration;

use crate::orders::SyncConfig;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./work_dir | Database and log directory |
/// | HTTP_PORT | 3000 | JSON API port |
/// | ORDER_SOURCE_URL | http://localhost:8080 | Remote order event source |
/// | POLL_INTERVAL_MS | 2000 | Delay between sync cycles |
/// | FETCH_TIMEOUT_MS | 10000 | Per-fetch timeout, 0 disables |
/// | LOG_LEVEL | info | Default log filter (RUST_LOG wins) |
/// | LOG_JSON | false | JSON console output |
/// | ENVIRONMENT | development | Environment label |
///
/// # Example
///
/// ```ignore
/// ORDER_SOURCE_URL=http://10.0.2.2:8080 POLL_INTERVAL_MS=5000 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and logs
    pub work_dir: String,
    pub http_port: u16,
    /// Base URL of the remote order event source
    pub order_source_url: String,
    pub poll_interval_ms: u64,
    /// `0` disables the per-fetch timeout
    pub fetch_timeout_ms: u64,
    pub log_level: String,
    pub log_json: bool,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            http_port: env_parse("HTTP_PORT", 3000),
            order_source_url: std::env::var("ORDER_SOURCE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS", 2000),
            fetch_timeout_ms: env_parse("FETCH_TIMEOUT_MS", 10_000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON", false),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the parts tests care about
    pub fn with_overrides(
        work_dir: impl Into<String>,
        http_port: u16,
        order_source_url: impl Into<String>,
    ) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config.order_source_url = order_source_url.into();
        config
    }

    /// Sync loop timing derived from the millisecond settings
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            fetch_timeout: (self.fetch_timeout_ms > 0)
                .then(|| Duration::from_millis(self.fetch_timeout_ms)),
        }
    }

    /// redb database file
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
