//! Worker-pool execution strategy
//!
//! Commands are sent over a bounded channel to a fixed set of worker tasks.
//! The caller waits for the worker's reply, so from the loop's point of view
//! dispatch is still one command at a time.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use common::error::Error;
use common::{InvocationContext, Invocation, InvocationOutcome};

use crate::local::LocalInvoker;
use crate::CommandInvoker;

/// One queued command
struct Job {
    /// Context of the dispatching caller
    ctx: InvocationContext,

    /// Command to run
    invocation: Invocation,

    /// Where the outcome goes
    reply: oneshot::Sender<InvocationOutcome>,
}

/// Executes commands on a pool of worker tasks
pub struct QueuedInvoker {
    /// Job sender, `None` once stopped
    job_tx: RwLock<Option<mpsc::Sender<Job>>>,

    /// Worker task handles
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl QueuedInvoker {
    /// Creates the invoker and spawns its workers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(workers: usize, queue_depth: usize) -> Self {
        let workers = workers.max(1);
        let (job_tx, job_rx) = mpsc::channel(queue_depth.max(1));
        let job_rx = Arc::new(Mutex::new(job_rx));

        let handles = (0..workers)
            .map(|worker_id| tokio::spawn(Self::worker_loop(worker_id, job_rx.clone())))
            .collect();

        info!("Started queued invoker with {} workers", workers);

        Self {
            job_tx: RwLock::new(Some(job_tx)),
            workers: parking_lot::Mutex::new(handles),
        }
    }

    /// Pulls jobs until the channel closes
    async fn worker_loop(worker_id: usize, job_rx: Arc<Mutex<mpsc::Receiver<Job>>>) {
        loop {
            let job = {
                let mut rx = job_rx.lock().await;
                rx.recv().await
            };

            let Some(job) = job else {
                break;
            };

            debug!(worker_id, cmd = job.invocation.entry().name(), "worker picked up command");

            let outcome = LocalInvoker::run(&job.ctx, &job.invocation).await;
            if job.reply.send(outcome).is_err() {
                warn!(worker_id, "caller went away before the outcome was delivered");
            }
        }

        debug!(worker_id, "worker stopped");
    }

    /// Returns true while the invoker accepts commands
    pub fn is_running(&self) -> bool {
        self.job_tx.read().is_some()
    }

    /// Stops accepting commands and waits for the workers to drain
    pub async fn stop(&self) {
        let sender = self.job_tx.write().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        info!("Stopping queued invoker");

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Invoker worker ended abnormally: {}", e);
            }
        }

        info!("Queued invoker stopped");
    }
}

#[async_trait]
impl CommandInvoker for QueuedInvoker {
    async fn invoke(&self, ctx: &InvocationContext, invocation: &Invocation) -> InvocationOutcome {
        let sender = self.job_tx.read().clone();
        let Some(sender) = sender else {
            return InvocationOutcome::failure(
                Error::Unavailable("queued invoker is stopped".to_string()).to_string(),
            );
        };

        let (reply, outcome_rx) = oneshot::channel();
        let job = Job {
            ctx: ctx.clone(),
            invocation: invocation.clone(),
            reply,
        };

        if sender.send(job).await.is_err() {
            return InvocationOutcome::failure(
                Error::Unavailable("no worker is accepting commands".to_string()).to_string(),
            );
        }

        match outcome_rx.await {
            Ok(outcome) => outcome,
            Err(_) => InvocationOutcome::failure(
                Error::Internal("worker dropped the command".to_string()).to_string(),
            ),
        }
    }

    fn name(&self) -> &'static str {
        "queued"
    }
}

impl Drop for QueuedInvoker {
    fn drop(&mut self) {
        for handle in self.workers.get_mut().drain(..) {
            handle.abort();
        }
    }
}
