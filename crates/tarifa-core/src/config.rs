//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use tracing::debug;

/// Hard upper bound on rows per batch statement
pub const MAX_CHUNK_SIZE: usize = 100;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub cgrates: CgratesConfig,
    #[serde(default)]
    pub importer: ImporterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Redis configuration (job queue and event channel)
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// List holding pending import jobs
    #[serde(default = "default_queue_key")]
    pub queue_key: String,

    /// Pub/sub channel receiving entity-created events
    #[serde(default = "default_events_channel")]
    pub events_channel: String,

    /// Blocking pop timeout in seconds
    #[serde(default = "default_pop_timeout")]
    pub pop_timeout_secs: u64,
}

fn default_queue_key() -> String {
    "jobs:rates:import".to_string()
}

fn default_events_channel() -> String {
    "events:entity_created".to_string()
}

fn default_pop_timeout() -> u64 {
    5
}

/// CGRateS JSON-RPC configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CgratesConfig {
    /// JSON-RPC endpoint (e.g., "http://127.0.0.1:2080/jsonrpc")
    pub url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_cgrates_timeout")]
    pub timeout_ms: u64,
}

fn default_cgrates_timeout() -> u64 {
    10_000
}

/// Importer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ImporterConfig {
    /// Root directory of uploaded rate files
    #[serde(default = "default_storage_path")]
    pub storage_path: String,

    /// Rows per batch statement (capped at MAX_CHUNK_SIZE)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_storage_path() -> String {
    "/opt/tarifa/storage/rate_groups".to_string()
}

fn default_chunk_size() -> usize {
    MAX_CHUNK_SIZE
}

impl ImporterConfig {
    /// Chunk size clamped to `1..=MAX_CHUNK_SIZE`
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.clamp(1, MAX_CHUNK_SIZE)
    }
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        debug!("Loading configuration for run mode {}", run_mode);

        let config = Config::builder()
            // Start with default values
            .set_default("database.max_connections", 5)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("redis.queue_key", default_queue_key())?
            .set_default("redis.events_channel", default_events_channel())?
            .set_default("redis.pop_timeout_secs", 5)?
            .set_default("cgrates.url", "http://127.0.0.1:2080/jsonrpc")?
            .set_default("cgrates.timeout_ms", 10_000)?
            .set_default("importer.storage_path", default_storage_path())?
            .set_default("importer.chunk_size", MAX_CHUNK_SIZE as i64)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with TARIFA_ prefix
            .add_source(
                Environment::with_prefix("TARIFA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("TARIFA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_importer_config() {
        let config = ImporterConfig::default();
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.effective_chunk_size(), 100);
    }

    #[test]
    fn test_chunk_size_is_capped() {
        let config = ImporterConfig {
            chunk_size: 5000,
            ..Default::default()
        };
        assert_eq!(config.effective_chunk_size(), MAX_CHUNK_SIZE);

        let config = ImporterConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_chunk_size(), 1);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: AppConfig = Config::builder()
            .set_override("database.url", "postgresql://localhost/tarifa")
            .unwrap()
            .set_override("redis.url", "redis://localhost:6379")
            .unwrap()
            .set_override("cgrates.url", "http://localhost:2080/jsonrpc")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.redis.queue_key, "jobs:rates:import");
        assert_eq!(config.cgrates.timeout_ms, 10_000);
        assert_eq!(config.importer.chunk_size, 100);
        assert!(!config.logging.json);
    }
}
