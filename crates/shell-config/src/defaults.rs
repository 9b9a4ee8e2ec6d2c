//! Configuration model and built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Prompt shown before every line read
pub const DEFAULT_PROMPT: &str = "cmd> ";

/// Upper bound handed to every dispatched command
pub const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 30;

/// Largest accepted dispatch timeout (one day)
pub const MAX_DISPATCH_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Banner printed when the operator types `exit`
pub const DEFAULT_FAREWELL: &str = "############ GoodBye!!! ###########";

/// Top-level shell configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Prompt text
    pub prompt: String,

    /// Per-dispatch timeout in seconds
    pub dispatch_timeout_secs: u64,

    /// Farewell banner
    pub farewell: String,

    /// Where line history is persisted, if anywhere
    pub history_file: Option<PathBuf>,

    /// Maximum number of history entries kept by the line editor
    pub history_size: usize,

    /// Print an "Execution Results" block after successful commands too
    pub show_results: bool,

    /// Execution strategy settings
    pub invoker: InvokerConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl ShellConfig {
    /// Dispatch timeout as a duration
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            dispatch_timeout_secs: DEFAULT_DISPATCH_TIMEOUT_SECS,
            farewell: DEFAULT_FAREWELL.to_string(),
            history_file: None,
            history_size: 1000,
            show_results: false,
            invoker: InvokerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Which execution strategy runs resolved commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvokerKind {
    /// Run the handler in the loop's own task
    Local,

    /// Hand the command to a pool of worker tasks
    Queued,
}

/// Execution strategy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    /// Strategy to use
    pub kind: InvokerKind,

    /// Worker count for the queued strategy
    pub workers: usize,

    /// Channel capacity for the queued strategy
    pub queue_depth: usize,

    /// Wrap the strategy with audit recording
    pub audit: bool,

    /// Audit records kept in memory
    pub audit_trail: usize,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            kind: InvokerKind::Local,
            workers: 2,
            queue_depth: 16,
            audit: false,
            audit_trail: 256,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output
    Pretty,

    /// Single-line human readable output
    Compact,

    /// Newline-delimited JSON
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}
