//! Error types for the common crate
//!
//! This module defines the error type shared by the registry, resolver,
//! invokers and the interactive loop.

use thiserror::Error;

/// Result type for toolshell operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for toolshell operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No registered command matches the input
    #[error("command not found")]
    CommandNotFound,

    /// Line input error (anything other than interrupt or end of input)
    #[error("Input error: {0}")]
    Input(String),

    /// A command returned after its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The execution strategy is not accepting work
    #[error("Invoker unavailable: {0}")]
    Unavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if the error is a command-not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::CommandNotFound)
    }

    /// Returns true if the error is a line input error
    pub fn is_input(&self) -> bool {
        matches!(self, Error::Input(_))
    }

    /// Returns true if the error is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
