//! Configuration validation

use common::error::{Error, Result};

use crate::defaults::{InvokerKind, ShellConfig, MAX_DISPATCH_TIMEOUT_SECS};

/// Checks a configuration before the shell is built
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the full configuration, reporting the first problem found
    pub fn validate(config: &ShellConfig) -> Result<()> {
        if config.prompt.trim().is_empty() {
            return Err(Error::Config("prompt must not be empty".to_string()));
        }

        if config.dispatch_timeout_secs == 0 {
            return Err(Error::Config(
                "dispatch_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if config.dispatch_timeout_secs > MAX_DISPATCH_TIMEOUT_SECS {
            return Err(Error::Config(format!(
                "dispatch_timeout_secs must be at most {}",
                MAX_DISPATCH_TIMEOUT_SECS
            )));
        }

        if config.invoker.kind == InvokerKind::Queued {
            if config.invoker.workers == 0 {
                return Err(Error::Config("invoker.workers must be at least 1".to_string()));
            }
            if config.invoker.queue_depth == 0 {
                return Err(Error::Config("invoker.queue_depth must be at least 1".to_string()));
            }
        }

        if config.logging.level.trim().is_empty() {
            return Err(Error::Config("logging.level must not be empty".to_string()));
        }

        Ok(())
    }
}
