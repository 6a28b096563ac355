//! Folding stage results into a pipeline verdict.

use crate::core::status::AtomicWaitState;
use crate::core::WaitState;
use crate::errors::{CommandError, Result};
use crate::events::{LogEntry, LogSink, PipelineRecord};
use crate::process::{join_relays, StreamRelay, Waiter};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Everything the deferred waiter of a pipeline needs.
pub(super) struct PendingPipeline {
    pub(super) command: String,
    pub(super) waiters: Vec<Waiter>,
    pub(super) relays: Vec<StreamRelay>,
    pub(super) accepted: BTreeSet<i32>,
    pub(super) log_sink: Option<Arc<dyn LogSink>>,
    pub(super) ignore_error_status: bool,
    pub(super) state: Arc<AtomicWaitState>,
}

impl PendingPipeline {
    /// Joins every inter-stage relay, then consults every stage waiter.
    ///
    /// All stages are consulted even after a failure so that each one is
    /// reaped and logged. Precedence of failures: an interruption, then a
    /// relay failure, then failed stages. Otherwise the last stage's code
    /// is the pipeline's code.
    pub(super) async fn finish(self) -> Result<i32> {
        let run_id = Uuid::new_v4();
        if let Some(sink) = &self.log_sink {
            sink.record(&LogEntry::Pipeline(PipelineRecord {
                run_id,
                command: self.command.clone(),
                stages: self.waiters.len(),
                started_at: Utc::now(),
            }));
        }

        let broken = join_relays(self.relays).await;

        let mut statuses = Vec::with_capacity(self.waiters.len());
        let mut failed = false;
        let mut interruption = None;
        for waiter in &self.waiters {
            match waiter.wait().await {
                Ok(status) => statuses.push(Some(status)),
                Err(e) => {
                    failed = true;
                    statuses.push(e.status());
                    if e.is_interrupted() && interruption.is_none() {
                        interruption = Some(e);
                    }
                }
            }
        }
        self.state.advance(WaitState::Exited);
        debug!(run_id = %run_id, pipeline = %self.command, statuses = ?statuses, "Pipeline stages collected");

        if let Some(interruption) = interruption {
            return Err(interruption);
        }
        if !broken.is_empty() {
            return Err(CommandError::relay(broken.join(", ")));
        }
        if failed {
            return Err(CommandError::StagesFailed {
                pipeline: self.command,
                statuses,
            });
        }

        let status = statuses.last().copied().flatten().unwrap_or_default();
        if !self.accepted.contains(&status) && !self.ignore_error_status {
            return Err(CommandError::exit_status(self.command, status));
        }
        Ok(status)
    }
}
