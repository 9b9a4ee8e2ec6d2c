//! Command execution strategies
//!
//! The interactive loop only knows the [`CommandInvoker`] trait. Which
//! strategy sits behind it (in-process, worker pool, audited) is decided once
//! at startup by [`build_invoker`].

mod audited;
mod local;
mod queued;

pub use audited::{AuditRecord, AuditedInvoker};
pub use local::LocalInvoker;
pub use queued::QueuedInvoker;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use common::{InvocationContext, Invocation, InvocationOutcome};
use shell_config::{InvokerConfig, InvokerKind};

/// Pluggable execution strategy for resolved commands
#[async_trait]
pub trait CommandInvoker: Send + Sync {
    /// Runs `invocation` under `ctx`.
    ///
    /// Implementations never fail or panic: every problem is reported through
    /// the returned outcome.
    async fn invoke(&self, ctx: &InvocationContext, invocation: &Invocation) -> InvocationOutcome;

    /// Short strategy name used in logs and audit records
    fn name(&self) -> &'static str;
}

/// Builds the configured strategy. Must be called from within a tokio runtime.
pub fn build_invoker(config: &InvokerConfig) -> Arc<dyn CommandInvoker> {
    let base: Arc<dyn CommandInvoker> = match config.kind {
        InvokerKind::Local => Arc::new(LocalInvoker::new()),
        InvokerKind::Queued => Arc::new(QueuedInvoker::new(config.workers, config.queue_depth)),
    };

    let invoker: Arc<dyn CommandInvoker> = if config.audit {
        Arc::new(AuditedInvoker::new(base, config.audit_trail))
    } else {
        base
    };

    info!("Using {} command invoker", invoker.name());

    invoker
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use common::{handler_fn, CommandEntry, InputLine, Invocation};

    /// Argument lists seen by a recording handler
    pub type Seen = Arc<Mutex<Vec<Vec<String>>>>;

    /// Entry whose handler records the arguments it was called with
    pub fn recording_entry(name: &str) -> (Arc<CommandEntry>, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let entry = CommandEntry::new(
            name,
            "records arguments",
            handler_fn(move |_ctx, args| {
                let sink = sink.clone();
                async move {
                    sink.lock().push(args);
                    Ok(())
                }
            }),
        );
        (Arc::new(entry), seen)
    }

    pub fn invocation(entry: Arc<CommandEntry>, line: &str, consumed: usize) -> Invocation {
        Invocation::new(entry, InputLine::parse(line), consumed)
    }
}
