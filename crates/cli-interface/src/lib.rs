//! Interactive command shell
//!
//! Commands are registered under one or more space-separated words, resolved
//! from an input line by greedy prefix matching and run through a pluggable
//! [`invoker::CommandInvoker`] under a per-dispatch deadline.

pub mod commands;
pub mod formatters;
pub mod input;
pub mod interactive;
pub mod registry;
pub mod resolver;
pub mod state;

// Re-export commonly used types
pub use commands::{EXIT_COMMAND, HELP_COMMAND};
pub use formatters::{ConsolePresenter, MemoryPresenter, Presenter};
pub use input::{LineReader, ReadEvent, ScriptedReader, StreamReader, TerminalReader};
pub use interactive::{DispatchReport, LineOutcome, Shell};
pub use registry::{CompletionSet, HelpIndex, Registry};
pub use resolver::Resolution;
pub use state::{ActivityFlag, ShellExit, ShellState, TerminalSignal};
