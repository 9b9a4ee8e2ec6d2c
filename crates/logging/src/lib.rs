//! Logging for toolshell
//!
//! Installs a `tracing` subscriber. Output goes to stderr so log lines do not
//! interleave with the interactive prompt on stdout.

use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use common::error::{Error, Result};
use shell_config::{LogFormat, LoggingConfig};

/// Global logger setup
pub struct Logger;

impl Logger {
    /// Installs the global subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    pub fn init(config: &LoggingConfig) -> Result<()> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => Self::parse_filter(&config.level)?,
        };

        let builder = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr);

        let installed = match config.format {
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };

        installed.map_err(|e| Error::Config(format!("failed to install logger: {}", e)))?;

        debug!(level = %config.level, format = ?config.format, "logging initialized");
        Ok(())
    }

    /// Parses a filter directive such as `info` or `cli_interface=debug,warn`
    pub fn parse_filter(directives: &str) -> Result<EnvFilter> {
        EnvFilter::try_new(directives)
            .map_err(|e| Error::Config(format!("invalid log filter '{}': {}", directives, e)))
    }
}
