//! Configuration management for toolshell
//!
//! This crate loads the shell's settings (prompt, dispatch timeout, invoker
//! strategy, logging) from defaults, an optional TOML file and the
//! environment.

pub mod defaults;
pub mod manager;
pub mod validation;

// Re-export commonly used types
pub use defaults::{InvokerConfig, InvokerKind, LogFormat, LoggingConfig, ShellConfig};
pub use manager::ConfigManager;
pub use validation::ConfigValidator;
