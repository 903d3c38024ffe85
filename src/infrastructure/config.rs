//! Configuration infrastructure
//!
//! Contains configuration loading and management for catalog
//! synchronization. The discovery heuristics (page ceiling, probe
//! threshold and range) depend on the actual catalog size, so they are
//! configuration fields rather than hard constants.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the remote catalog API
    pub base_url: String,

    /// SQLite database URL for the local store
    pub database_url: String,

    /// Synchronization engine settings
    pub sync: SyncConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            database_url: defaults::DATABASE_URL.to_string(),
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Synchronization engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Characters requested per pagination page
    pub page_size: u32,

    /// Ceiling on pages walked during discovery
    pub max_pages: u32,

    /// Below this many distinct IDs from pagination, the range probe runs
    pub probe_threshold: usize,

    /// First ID probed by the range fallback (inclusive)
    pub probe_range_start: i64,

    /// Last ID probed by the range fallback (inclusive)
    pub probe_range_end: i64,

    /// In-flight request cap shared by probes and detail fetches
    pub max_concurrent_requests: usize,

    /// Detail fetches grouped per batch
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    pub batch_delay_ms: u64,

    /// Maximum attempts per remote operation
    pub max_retries: u32,

    /// Base backoff delay in milliseconds
    pub retry_base_delay_ms: u64,

    /// Backoff cap in milliseconds
    pub retry_max_delay_ms: u64,

    /// Timeout for page and probe requests in seconds
    pub page_timeout_secs: u64,

    /// Timeout for full-record requests in seconds
    pub detail_timeout_secs: u64,

    /// Timeout for reference requests in seconds
    pub reference_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::PAGE_SIZE,
            max_pages: defaults::MAX_PAGES,
            probe_threshold: defaults::PROBE_THRESHOLD,
            probe_range_start: defaults::PROBE_RANGE_START,
            probe_range_end: defaults::PROBE_RANGE_END,
            max_concurrent_requests: defaults::MAX_CONCURRENT_REQUESTS,
            batch_size: defaults::BATCH_SIZE,
            batch_delay_ms: defaults::BATCH_DELAY_MS,
            max_retries: defaults::MAX_RETRIES,
            retry_base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
            page_timeout_secs: defaults::PAGE_TIMEOUT_SECONDS,
            detail_timeout_secs: defaults::DETAIL_TIMEOUT_SECONDS,
            reference_timeout_secs: defaults::REFERENCE_TIMEOUT_SECONDS,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable console output
    pub console_output: bool,

    /// Enable daily-rotated file output under `logs/`
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("swapi-sync");

        Ok(config_dir)
    }

    /// Create a new configuration manager pointing at the default path
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        let config_path = config_dir.join("swapi_sync_config.json");

        Ok(Self { config_path })
    }

    /// Create a configuration manager with an explicit path
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Load the configuration, writing defaults to disk on first run
    pub async fn initialize_on_first_run(&self) -> Result<AppConfig> {
        let config_dir = self
            .config_path
            .parent()
            .context("Failed to get config directory")?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)
                .await
                .context("Failed to create config directory")?;
        }

        if self.config_path.exists() {
            self.load_config().await
        } else {
            info!(
                "First run detected - writing default configuration to {:?}",
                self.config_path
            );
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            Ok(default_config)
        }
    }

    /// Load configuration from the config file
    pub async fn load_config(&self) -> Result<AppConfig> {
        let contents = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read config file {:?}", self.config_path))?;

        let config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.config_path))?;

        Ok(config)
    }

    /// Save configuration to the config file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, contents)
            .await
            .with_context(|| format!("Failed to write config file {:?}", self.config_path))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

/// Default configuration values
pub mod defaults {
    /// Default remote catalog base URL
    pub const BASE_URL: &str = "https://www.swapi.tech/api";

    /// Default SQLite database URL
    pub const DATABASE_URL: &str = "sqlite:starwars_characters.db";

    /// Default characters per pagination page
    pub const PAGE_SIZE: u32 = 10;

    /// Default ceiling on pages walked during discovery
    pub const MAX_PAGES: u32 = 50;

    /// Default minimum pagination yield before the range probe runs
    pub const PROBE_THRESHOLD: usize = 30;

    /// Default probe range start (inclusive)
    pub const PROBE_RANGE_START: i64 = 1;

    /// Default probe range end (inclusive)
    pub const PROBE_RANGE_END: i64 = 150;

    /// Default maximum concurrent in-flight requests
    pub const MAX_CONCURRENT_REQUESTS: usize = 10;

    /// Default detail fetches per batch
    pub const BATCH_SIZE: usize = 5;

    /// Default pause between batches in milliseconds
    pub const BATCH_DELAY_MS: u64 = 2000;

    /// Default retry attempts for failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Default base backoff delay in milliseconds
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;

    /// Default backoff cap in milliseconds
    pub const RETRY_MAX_DELAY_MS: u64 = 30000;

    /// Default page/probe request timeout in seconds
    pub const PAGE_TIMEOUT_SECONDS: u64 = 10;

    /// Default full-record request timeout in seconds
    pub const DETAIL_TIMEOUT_SECONDS: u64 = 15;

    /// Default reference request timeout in seconds
    pub const REFERENCE_TIMEOUT_SECONDS: u64 = 10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = AppConfig::default();
        assert!(config.sync.page_size > 0);
        assert!(config.sync.batch_size > 0);
        assert!(config.sync.max_concurrent_requests > 0);
        assert!(config.sync.probe_range_start <= config.sync.probe_range_end);
        assert!(config.base_url.starts_with("http"));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sync.probe_threshold, config.sync.probe_threshold);
        assert_eq!(parsed.database_url, config.database_url);
    }

    #[tokio::test]
    async fn first_run_writes_defaults_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));

        let config = manager.initialize_on_first_run().await.unwrap();
        assert!(manager.config_path().exists());
        assert_eq!(config.sync.max_pages, defaults::MAX_PAGES);

        // Second call loads the saved file instead of rewriting it
        let reloaded = manager.initialize_on_first_run().await.unwrap();
        assert_eq!(reloaded.base_url, config.base_url);
    }
}
