//! The pipeline type and its spawn logic.

use super::collect::PendingPipeline;
use crate::context::ExecutionContext;
use crate::core::status::AtomicWaitState;
use crate::core::WaitState;
use crate::errors::{CommandError, Result};
use crate::process::{ProcessHandle, StreamRelay, Waiter};
use crate::stages::{Command, Runnable};
use async_trait::async_trait;
use futures::FutureExt;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// An ordered chain of stages, each one's output feeding the next one's input.
///
/// A pipeline always has at least one stage. Its exit status is the exit
/// status of its last stage, validated against the pipeline's own accepted
/// set (`{0}` by default). A pipeline is itself [`Runnable`], so it can be a
/// stage of another pipeline.
///
/// ```rust,ignore
/// let lines = Command::new("dmesg")
///     .pipe(Command::new("grep").arg("usb").accept_status(1))
///     .accept_status(1)
///     .run_lines(&ctx)
///     .await?;
/// ```
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Box<dyn Runnable>>,
    accepted: BTreeSet<i32>,
    input: Option<Vec<u8>>,
}

impl Pipeline {
    /// Creates a pipeline whose first stage is `first`.
    #[must_use]
    pub fn new(first: impl Runnable + 'static) -> Self {
        Self {
            stages: vec![Box::new(first)],
            accepted: BTreeSet::from([0]),
            input: None,
        }
    }

    /// Creates a pipeline from already boxed stages.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EmptyPipeline`] if `stages` is empty.
    pub fn from_stages(stages: Vec<Box<dyn Runnable>>) -> Result<Self> {
        if stages.is_empty() {
            return Err(CommandError::EmptyPipeline);
        }
        Ok(Self {
            stages,
            accepted: BTreeSet::from([0]),
            input: None,
        })
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, next: impl Runnable + 'static) -> Self {
        self.stages.push(Box::new(next));
        self
    }

    /// Appends a stage built from `argv`.
    #[must_use]
    pub fn pipe_argv<I, S>(self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stage(Command::from_argv(argv))
    }

    /// Appends a stage; alias of [`stage`](Self::stage) that reads like a shell.
    #[must_use]
    pub fn pipe(self, next: impl Runnable + 'static) -> Self {
        self.stage(next)
    }

    /// Treats `status` of the last stage as success for the whole pipeline.
    #[must_use]
    pub fn accept_status(mut self, status: i32) -> Self {
        self.accepted.insert(status);
        self
    }

    /// Sets the bytes fed to the first stage; replaces earlier input.
    ///
    /// Without it, the first stage's own input is used. Input configured on
    /// later stages is ignored since their input is the previous stage.
    #[must_use]
    pub fn input(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.input = Some(data.into());
        self
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false; a pipeline has at least one stage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the accepted exit codes.
    #[must_use]
    pub fn accepted_statuses(&self) -> &BTreeSet<i32> {
        &self.accepted
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.stages.iter().map(|s| s.describe()).collect();
        write!(f, "{}", parts.join(" | "))
    }
}

#[async_trait]
impl Runnable for Pipeline {
    fn describe(&self) -> String {
        self.to_string()
    }

    fn input(&self) -> Option<&[u8]> {
        self.input
            .as_deref()
            .or_else(|| self.stages.first().and_then(|s| s.input()))
    }

    async fn spawn(&self, ctx: &ExecutionContext) -> Result<ProcessHandle> {
        let command = self.to_string();

        // Left to right: a stage's input must exist before a relay can feed it.
        let mut handles: Vec<ProcessHandle> = Vec::with_capacity(self.stages.len());
        for (index, stage) in self.stages.iter().enumerate() {
            match stage.spawn(ctx).await {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    warn!(
                        pipeline = %command,
                        stage = index,
                        error = %err,
                        "Stage failed to start, discarding started stages"
                    );
                    discard(handles, &format!("stage {index} of '{command}' failed to start")).await;
                    return Err(err);
                }
            }
        }

        let state = Arc::new(AtomicWaitState::new(WaitState::Spawned));
        let cancel = ctx.cancellation().cloned();
        let mut relays = Vec::with_capacity(handles.len().saturating_sub(1));
        for index in 1..handles.len() {
            let upstream = handles[index - 1].take_stdout();
            let downstream = handles[index].take_stdin();
            if let (Some(source), Some(sink)) = (upstream, downstream) {
                relays.push(StreamRelay::start(
                    format!("stage {} -> stage {index} of '{command}'", index - 1),
                    source,
                    sink,
                    cancel.clone(),
                ));
            }
        }
        state.advance(WaitState::Draining);
        debug!(pipeline = %command, stages = handles.len(), relays = relays.len(), "Spawned pipeline");

        let stdin = handles.first_mut().and_then(ProcessHandle::take_stdin);
        let stdout = handles.last_mut().and_then(ProcessHandle::take_stdout);
        let aborts = handles
            .iter()
            .flat_map(|h| h.abort_tokens().iter().cloned())
            .collect();
        let waiters: Vec<Waiter> = handles.into_iter().map(ProcessHandle::into_waiter).collect();

        let pending = PendingPipeline {
            command: command.clone(),
            waiters,
            relays,
            accepted: self.accepted.clone(),
            log_sink: ctx.log_sink().cloned(),
            ignore_error_status: ctx.is_ignore_error_status(),
            state: Arc::clone(&state),
        };

        Ok(ProcessHandle::new(
            stdin,
            stdout,
            Waiter::new(command, state, pending.finish().boxed()),
            aborts,
        ))
    }
}

/// Closes, kills and reaps stages that were started before a later stage
/// failed to launch.
async fn discard(handles: Vec<ProcessHandle>, reason: &str) {
    for mut handle in handles {
        handle.close_streams();
        handle.abort(reason);
        let waiter = handle.into_waiter();
        if let Err(e) = waiter.wait().await {
            debug!(stage = %waiter.label(), error = %e, "Discarded stage");
        }
    }
}
