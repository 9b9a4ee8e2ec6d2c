//! Loop state and exit reasons

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle of the interactive loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShellState {
    /// Loop is reading and dispatching lines
    Running,

    /// Loop is not running (not started yet, or returned)
    #[default]
    Stopped,
}

impl ShellState {
    /// Returns true if the loop is running
    pub fn is_running(&self) -> bool {
        matches!(self, ShellState::Running)
    }

    /// Returns true if the loop is stopped
    pub fn is_stopped(&self) -> bool {
        matches!(self, ShellState::Stopped)
    }
}

impl fmt::Display for ShellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellState::Running => write!(f, "Running"),
            ShellState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Requests that end the whole process rather than just the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalSignal {
    /// Operator typed `exit`
    Exit,

    /// Ctrl-C while waiting for input
    Interrupt,

    /// Input closed
    EndOfInput,
}

impl TerminalSignal {
    /// Process exit code for this signal
    pub fn exit_code(&self) -> i32 {
        0
    }
}

/// Why [`crate::Shell::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// The stop signal fired; the caller keeps running
    Stopped,

    /// The process should terminate
    Terminate(TerminalSignal),
}

impl ShellExit {
    /// Gets the terminal signal, if the process should terminate
    pub fn terminal_signal(&self) -> Option<TerminalSignal> {
        match self {
            ShellExit::Stopped => None,
            ShellExit::Terminate(signal) => Some(*signal),
        }
    }
}

/// Shared view of whether the shell is executing a command right now
#[derive(Debug, Clone, Default)]
pub struct ActivityFlag {
    busy: Arc<AtomicBool>,
}

impl ActivityFlag {
    /// Returns true while a dispatched command is running
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Marks the shell busy until the returned guard is dropped
    pub(crate) fn enter(&self) -> BusyGuard {
        self.busy.store(true, Ordering::SeqCst);
        BusyGuard {
            busy: self.busy.clone(),
        }
    }
}

/// Clears the activity flag on drop
pub(crate) struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
