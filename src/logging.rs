//! Tracing setup.
//!
//! Installs a global `tracing-subscriber` fmt subscriber. `RUST_LOG`, when
//! set, takes precedence over the configured level.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{ScopeError, ScopeResult};

/// Build the env filter: `RUST_LOG` if present, otherwise `config.level`.
pub fn env_filter(config: &LoggingConfig) -> ScopeResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| ScopeError::Config(format!("invalid log level '{}': {}", config.level, e))),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> ScopeResult<()> {
    let filter = env_filter(config)?;
    let builder = fmt().with_env_filter(filter).with_thread_names(true);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().with_ansi(false).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| ScopeError::Config(format!("failed to install tracing subscriber: {}", e)))
}
