//! Tracing subscriber initialisation
//!
//! Logs always go to stderr; stdout belongs to the stdio transport.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{ToolgateError, ToolgateResult};

/// Build the filter: `RUST_LOG` wins over the configured level
pub fn build_filter(config: &LoggingConfig) -> ToolgateResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| ToolgateError::config(format!("invalid log level '{}': {}", config.level, e)))
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> ToolgateResult<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| ToolgateError::config(format!("failed to install logger: {}", e)))
}
