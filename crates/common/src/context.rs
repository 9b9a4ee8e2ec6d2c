//! Invocation context
//!
//! A cancellable, deadline-bearing context handed to every command handler.
//! The deadline only cancels the context; handlers that never look at it are
//! not interrupted.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Context passed through an invoker to a command handler
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Cancelled when the deadline passes or the owning guard is dropped
    token: CancellationToken,

    /// Point in time after which the context counts as expired
    deadline: Option<Instant>,
}

impl InvocationContext {
    /// Creates a context that is never cancelled on its own
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Creates a context that is cancelled once `timeout` has elapsed.
    ///
    /// Dropping the returned guard cancels the context immediately and stops
    /// the deadline timer. A timeout too large to represent as an instant
    /// yields a context without a deadline. Must be called from within a
    /// tokio runtime.
    pub fn with_timeout(timeout: Duration) -> (Self, DropGuard) {
        let deadline = Instant::now().checked_add(timeout);
        let token = CancellationToken::new();

        if let Some(deadline) = deadline {
            let timer = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => timer.cancel(),
                    _ = timer.cancelled() => {}
                }
            });
        }

        let guard = token.clone().drop_guard();
        (Self { token, deadline }, guard)
    }

    /// Returns true once the context has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the context is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Returns true if the context has a deadline and it has passed
    pub fn deadline_exceeded(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// Gets the deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::background()
    }
}
