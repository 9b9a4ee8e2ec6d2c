//! Input resolution
//!
//! Tokens are appended one by one, without separators, to an accumulator.
//! After each token the accumulator's hash is looked up and the first hit
//! wins. With both "a" and "a b" registered, `a b` therefore resolves to
//! "a" and `b` is left over as its argument.

use std::sync::Arc;

use tracing::debug;

use common::error::{Error, Result};
use common::utils::hash_key;
use common::CommandEntry;

use crate::registry::Registry;

/// A resolved command and how many leading tokens named it
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Matched entry
    pub entry: Arc<CommandEntry>,

    /// Number of tokens consumed by the command name
    pub consumed: usize,
}

/// Finds the earliest registered command formed by a prefix of `tokens`
pub fn resolve(registry: &Registry, tokens: &[String]) -> Result<Resolution> {
    let mut accumulated = String::new();

    for (index, token) in tokens.iter().enumerate() {
        accumulated.push_str(token);

        let key = hash_key(accumulated.trim());
        let found = registry.lookup(key);
        debug!(cmd = %accumulated, key, ok = found.is_some(), "find command");

        if let Some(entry) = found {
            return Ok(Resolution {
                entry,
                consumed: index + 1,
            });
        }
    }

    Err(Error::CommandNotFound)
}
