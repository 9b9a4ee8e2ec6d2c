//! Common data models for toolshell
//!
//! This module defines the values that flow between the registry, the
//! resolver, the invokers and the interactive loop.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::InvocationContext;
use crate::handler::CommandHandler;

/// A registered named action
#[derive(Clone)]
pub struct CommandEntry {
    /// Human-readable name, may span several words ("show version")
    name: String,

    /// One-line help text
    description: String,

    /// Whether the handler receives the argument tokens unparsed
    raw_arguments: bool,

    /// Executable capability
    handler: Arc<dyn CommandHandler>,
}

impl CommandEntry {
    /// Creates a new command entry
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl CommandHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            raw_arguments: false,
            handler: Arc::new(handler),
        }
    }

    /// Sets the argument parsing policy
    pub fn with_raw_arguments(mut self, raw: bool) -> Self {
        self.raw_arguments = raw;
        self
    }

    /// Gets the command name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the command description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns true if arguments are passed through verbatim
    pub fn raw_arguments(&self) -> bool {
        self.raw_arguments
    }

    /// Runs the handler
    pub async fn execute(&self, ctx: &InvocationContext, args: &[String]) -> anyhow::Result<()> {
        self.handler.run(ctx, args).await
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("raw_arguments", &self.raw_arguments)
            .finish_non_exhaustive()
    }
}

/// Tokens of one line of operator input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLine {
    tokens: Vec<String>,
}

impl InputLine {
    /// Splits a raw line on whitespace
    pub fn parse(line: &str) -> Self {
        Self {
            tokens: line.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Creates an input line from already split tokens
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Gets all tokens
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Gets the first token
    pub fn first(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Returns true if the line held no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

/// A resolved command paired with the line that selected it
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Resolved entry
    entry: Arc<CommandEntry>,

    /// Full original input, including the matched name tokens
    line: InputLine,

    /// How many leading tokens formed the command name
    consumed: usize,
}

impl Invocation {
    /// Creates a new invocation; `consumed` is clamped to the line length
    pub fn new(entry: Arc<CommandEntry>, line: InputLine, consumed: usize) -> Self {
        let consumed = consumed.min(line.len());
        Self {
            entry,
            line,
            consumed,
        }
    }

    /// Gets the resolved entry
    pub fn entry(&self) -> &CommandEntry {
        &self.entry
    }

    /// Gets the full input line
    pub fn line(&self) -> &InputLine {
        &self.line
    }

    /// Tokens left over for the handler
    pub fn arguments(&self) -> &[String] {
        &self.line.tokens()[self.consumed..]
    }
}

/// Result of one dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationOutcome {
    /// Whether the handler completed without error
    pub succeeded: bool,

    /// Failure text, only set when `succeeded` is false
    pub failure_reason: Option<String>,
}

impl InvocationOutcome {
    /// Creates a successful outcome
    pub fn success() -> Self {
        Self {
            succeeded: true,
            failure_reason: None,
        }
    }

    /// Creates a failed outcome
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            failure_reason: Some(reason.into()),
        }
    }

    /// Gets the failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }
}

impl From<anyhow::Result<()>> for InvocationOutcome {
    fn from(result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => Self::success(),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}
