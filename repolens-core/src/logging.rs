//! Structured logging setup with tracing

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Logging initialization errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter directive: {0}")]
    Filter(String),
    #[error("Failed to install global subscriber: {0}")]
    Subscriber(String),
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level so operators can
/// adjust verbosity without touching configuration files.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) => EnvFilter::try_new(directive),
        Err(_) => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| LoggingError::Filter(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| LoggingError::Subscriber(e.to_string()))
}
