//! Structured logging setup.
//!
//! Hosts that drive the builder call [`init`] once at startup. `RUST_LOG`
//! takes precedence over the configured level.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Errors that can occur while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {reason}")]
    AlreadyInitialized {
        /// Message from the subscriber registry.
        reason: String,
    },
}

/// Install the global `tracing` subscriber.
///
/// # Errors
///
/// Returns [`LoggingError::AlreadyInitialized`] if another subscriber was
/// installed first.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|err| LoggingError::AlreadyInitialized {
        reason: err.to_string(),
    })
}
