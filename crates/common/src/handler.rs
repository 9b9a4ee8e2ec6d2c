//! Command handler capability
//!
//! Business-logic modules implement [`CommandHandler`] (or wrap a closure
//! with [`handler_fn`]) and hand it to the registry inside a command entry.

use std::future::Future;

use async_trait::async_trait;

use crate::context::InvocationContext;

/// Executable part of a registered command
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Runs the command with the tokens that followed the command name.
    ///
    /// Long-running handlers should watch `ctx` and stop once it is cancelled.
    async fn run(&self, ctx: &InvocationContext, args: &[String]) -> anyhow::Result<()>;
}

/// Handler backed by an async closure
pub struct FnHandler<F> {
    f: F,
}

/// Wraps an async closure as a [`CommandHandler`].
///
/// The closure receives owned copies of the context and arguments so the
/// returned future can be `'static`.
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(InvocationContext, Vec<String>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(InvocationContext, Vec<String>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn run(&self, ctx: &InvocationContext, args: &[String]) -> anyhow::Result<()> {
        (self.f)(ctx.clone(), args.to_vec()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_handler_fn_receives_arguments() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let handler = handler_fn(move |_ctx, args| {
            let counter = counter.clone();
            async move {
                counter.store(args.len(), Ordering::SeqCst);
                Ok(())
            }
        });

        let args = vec!["extra".to_string(), "args".to_string()];
        handler
            .run(&InvocationContext::background(), &args)
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handler_fn_propagates_error() {
        let handler = handler_fn(|_ctx, _args| async { Err(anyhow::anyhow!("X")) });
        let err = handler
            .run(&InvocationContext::background(), &[])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "X");
    }
}
