//! Logging system configuration and initialization
//!
//! Console output via `tracing_subscriber::fmt`, optional daily-rotated
//! file output via `tracing-appender`. The non-blocking writer guard must
//! outlive the process, so it is parked in a process-wide cell.

use anyhow::{Result, anyhow};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::infrastructure::config::LoggingConfig;

// Keeps the file writer alive for the lifetime of the process
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Get the log directory relative to the current working directory
pub fn get_log_directory() -> PathBuf {
    std::env::current_dir().unwrap_or_default().join("logs")
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize the logging system from configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let console_layer = config
        .console_output
        .then(|| tracing_subscriber::fmt::layer().with_target(false));

    let file_layer = if config.file_output {
        let file_appender = tracing_appender::rolling::daily(get_log_directory(), "swapi-sync.log");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        LOG_GUARD
            .set(guard)
            .map_err(|_| anyhow!("Logging already initialized"))?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        )
    } else {
        None
    };

    Registry::default()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
