//! Global `tracing` subscriber setup.
//!
//! Library code only emits events; the embedding binary calls
//! [`init_tracing`] once at startup.

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::config::LoggingConfig;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{directive}': {reason}")]
    Filter { directive: String, reason: String },

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Parses an `EnvFilter` directive such as `info` or `mailsift=debug,warn`.
pub fn filter_from_directive(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::Filter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

/// Installs the global subscriber and bridges `log` records into it.
///
/// `RUST_LOG` overrides `config.level`. Fails if a subscriber or logger is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter_from_directive(&config.level)?,
    };

    tracing_log::LogTracer::init().map_err(|e| TelemetryError::Init(e.to_string()))?;

    let installed = if config.json {
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_target(true));
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(true));
        tracing::subscriber::set_global_default(subscriber)
    };
    installed.map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::debug!(level = %config.level, json = config.json, "Tracing initialized");
    Ok(())
}
