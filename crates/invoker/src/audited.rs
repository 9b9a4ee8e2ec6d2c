//! Auditing decorator
//!
//! Wraps any invoker and records who ran what, how it ended and how long it
//! took. Records go to the `toolshell::audit` log target and to a bounded
//! in-memory trail.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use common::utils::truncate_string;
use common::{InvocationContext, Invocation, InvocationOutcome};

use crate::CommandInvoker;

/// Longest argument string written to the audit log
const LOGGED_ARGUMENTS_MAX: usize = 120;

/// One audited dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record identifier
    pub id: Uuid,

    /// Registered command name
    pub command: String,

    /// Arguments passed to the handler
    pub arguments: Vec<String>,

    /// Whether the command succeeded
    pub succeeded: bool,

    /// Failure reason, if any
    pub failure_reason: Option<String>,

    /// Wall time spent in the inner invoker
    pub elapsed_ms: u64,

    /// When the dispatch started
    pub started_at: DateTime<Utc>,

    /// Strategy that executed the command
    pub invoker: String,
}

/// Invoker decorator that records every dispatch
pub struct AuditedInvoker {
    /// Strategy doing the actual work
    inner: Arc<dyn CommandInvoker>,

    /// Most recent records, oldest first
    trail: Mutex<VecDeque<AuditRecord>>,

    /// Maximum records kept
    capacity: usize,
}

impl AuditedInvoker {
    /// Wraps `inner`, keeping at most `capacity` records in memory
    pub fn new(inner: Arc<dyn CommandInvoker>, capacity: usize) -> Self {
        Self {
            inner,
            trail: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Snapshot of the in-memory trail
    pub fn records(&self) -> Vec<AuditRecord> {
        self.trail.lock().iter().cloned().collect()
    }

    fn push(&self, record: AuditRecord) {
        if self.capacity == 0 {
            return;
        }

        let mut trail = self.trail.lock();
        while trail.len() >= self.capacity {
            trail.pop_front();
        }
        trail.push_back(record);
    }
}

#[async_trait]
impl CommandInvoker for AuditedInvoker {
    async fn invoke(&self, ctx: &InvocationContext, invocation: &Invocation) -> InvocationOutcome {
        let started_at = Utc::now();
        let start = Instant::now();

        let outcome = self.inner.invoke(ctx, invocation).await;

        let record = AuditRecord {
            id: Uuid::new_v4(),
            command: invocation.entry().name().to_string(),
            arguments: invocation.arguments().to_vec(),
            succeeded: outcome.succeeded,
            failure_reason: outcome.failure_reason.clone(),
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            started_at,
            invoker: self.inner.name().to_string(),
        };

        info!(
            target: "toolshell::audit",
            id = %record.id,
            command = %record.command,
            arguments = %truncate_string(&record.arguments.join(" "), LOGGED_ARGUMENTS_MAX),
            succeeded = record.succeeded,
            reason = record.failure_reason.as_deref().unwrap_or(""),
            elapsed_ms = record.elapsed_ms,
            invoker = %record.invoker,
            "command audited"
        );

        self.push(record);

        outcome
    }

    fn name(&self) -> &'static str {
        "audited"
    }
}
