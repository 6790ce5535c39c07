//! Structured logging infrastructure for TwoKey.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.
//! Library crates only emit `tracing` events; installing a subscriber is
//! left to the host process.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{CoreError, Result};

/// Initialize the logging system with structured output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use twokey_core::logging;
///
/// logging::init();
/// tracing::info!("Vault host started");
/// ```
pub fn init() {
    install(&LoggingConfig::default());
}

/// Initialize the logging system with JSON output for log aggregation.
pub fn init_json() {
    install(&LoggingConfig {
        json: true,
        ..LoggingConfig::default()
    });
}

fn install(config: &LoggingConfig) {
    // the default `info` directive always parses
    let _ = init_with(config);
}

/// Initialize logging from a [`LoggingConfig`].
///
/// `RUST_LOG` still wins over `config.level`. Calling this again after a
/// subscriber is installed leaves the existing one in place.
pub fn init_with(config: &LoggingConfig) -> Result<()> {
    let filter = filter_for(config)?;
    let layer = fmt::layer().with_target(true).with_thread_ids(true);

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry().with(filter).with(layer).try_init()
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed, keeping it");
    }
    Ok(())
}

fn filter_for(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            CoreError::Config(format!("invalid log level {:?}: {}", config.level, e))
        }),
    }
}
