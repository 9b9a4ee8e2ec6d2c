//! In-process execution strategy
//!
//! Runs the handler in the caller's task. Handler errors and panics become a
//! failed outcome; nothing escapes to the caller.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{error, info};

use common::{InvocationContext, Invocation, InvocationOutcome};

use crate::CommandInvoker;

/// Executes commands synchronously in the calling task
#[derive(Debug, Default, Clone)]
pub struct LocalInvoker;

impl LocalInvoker {
    /// Creates a new local invoker
    pub fn new() -> Self {
        Self
    }

    /// Runs one invocation to completion and converts the result
    pub(crate) async fn run(ctx: &InvocationContext, invocation: &Invocation) -> InvocationOutcome {
        let entry = invocation.entry();
        info!(cmd = entry.name(), args = ?invocation.arguments(), "exec cmd");

        let execution = AssertUnwindSafe(entry.execute(ctx, invocation.arguments())).catch_unwind();

        match execution.await {
            Ok(Ok(())) => InvocationOutcome::success(),
            Ok(Err(e)) => {
                error!(cmd = entry.name(), error = %e, "execute command error");
                InvocationOutcome::failure(e.to_string())
            }
            Err(payload) => {
                let reason = format!("command panicked: {}", panic_message(payload.as_ref()));
                error!(cmd = entry.name(), "{}", reason);
                InvocationOutcome::failure(reason)
            }
        }
    }
}

#[async_trait]
impl CommandInvoker for LocalInvoker {
    async fn invoke(&self, ctx: &InvocationContext, invocation: &Invocation) -> InvocationOutcome {
        Self::run(ctx, invocation).await
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
