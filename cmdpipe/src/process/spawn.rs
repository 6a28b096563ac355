//! Spawning one OS process for a resolved invocation.

use super::{BoxedReader, BoxedWriter, CaptureBuffer, ProcessHandle, StreamRelay, Waiter};
use crate::cancellation::{cancelled_or_never, CancellationToken};
use crate::context::ExecutionContext;
use crate::core::status::AtomicWaitState;
use crate::core::WaitState;
use crate::errors::{CommandError, Result};
use crate::events::{LogEntry, LogSink, StageRecord};
use crate::stages::Invocation;
use chrono::Utc;
use futures::FutureExt;
use std::collections::BTreeSet;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command as OsCommand};
use tracing::debug;

/// Exit code reported when no code could be observed.
const UNKNOWN_STATUS: i32 = -1;

/// How long the waiter waits for the error stream to end after the process
/// exited. Descendants that inherited the stream can keep it open.
const STDERR_GRACE: Duration = Duration::from_millis(250);

/// Spawns the process described by `invocation`.
///
/// `command` is the display form used in errors and log records. The
/// process's error stream is drained into memory right away so that a
/// chatty process cannot block on a full pipe.
pub(crate) fn spawn_stage(
    command: String,
    invocation: Invocation,
    accepted: BTreeSet<i32>,
    ctx: &ExecutionContext,
) -> Result<ProcessHandle> {
    let Some((program, args)) = invocation.argv.split_first() else {
        return Err(CommandError::launch(
            command,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argument vector"),
        ));
    };

    let mut os_command = OsCommand::new(program);
    os_command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &invocation.working_dir {
        os_command.current_dir(dir);
    }

    let mut child = os_command
        .spawn()
        .map_err(|e| CommandError::launch(command.clone(), e))?;

    debug!(
        command = %command,
        pid = ?child.id(),
        elevated = invocation.elevated,
        chroot = ?invocation.chroot_dir,
        "Spawned process"
    );

    let stdin = child
        .stdin
        .take()
        .map(|pipe| Box::new(pipe) as BoxedWriter);
    let stdout = child
        .stdout
        .take()
        .map(|pipe| Box::new(pipe) as BoxedReader);

    let state = Arc::new(AtomicWaitState::new(WaitState::Spawned));
    let stderr = CaptureBuffer::new();
    let drain = child
        .stderr
        .take()
        .map(|pipe| StreamRelay::start(format!("stderr of '{command}'"), pipe, stderr.clone(), None));
    state.advance(WaitState::Draining);

    let kill = Arc::new(CancellationToken::new());
    let pending = PendingStage {
        child,
        drain,
        stderr,
        command: command.clone(),
        invocation,
        accepted,
        log_sink: ctx.log_sink().cloned(),
        ignore_error_status: ctx.is_ignore_error_status(),
        cancellation: ctx.cancellation().cloned(),
        kill: Arc::clone(&kill),
        state: Arc::clone(&state),
    };

    Ok(ProcessHandle::new(
        stdin,
        stdout,
        Waiter::new(command, state, pending.finish().boxed()),
        vec![kill],
    ))
}

/// Everything the deferred waiter of one process needs.
struct PendingStage {
    child: Child,
    drain: Option<StreamRelay>,
    stderr: CaptureBuffer,
    command: String,
    invocation: Invocation,
    accepted: BTreeSet<i32>,
    log_sink: Option<Arc<dyn LogSink>>,
    ignore_error_status: bool,
    cancellation: Option<Arc<CancellationToken>>,
    kill: Arc<CancellationToken>,
    state: Arc<AtomicWaitState>,
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    Interrupted(String),
}

impl PendingStage {
    async fn finish(mut self) -> Result<i32> {
        let outcome = tokio::select! {
            status = self.child.wait() => Outcome::Exited(status),
            () = cancelled_or_never(self.cancellation.as_deref()) => {
                Outcome::Interrupted(reason_of(self.cancellation.as_deref()))
            }
            () = self.kill.cancelled() => Outcome::Interrupted(reason_of(Some(&self.kill))),
        };

        let (status, failure) = match outcome {
            Outcome::Exited(Ok(status)) => (exit_code(status), None),
            Outcome::Exited(Err(e)) => (UNKNOWN_STATUS, Some(CommandError::wait(e))),
            Outcome::Interrupted(reason) => {
                debug!(command = %self.command, reason = %reason, "Killing process");
                let _ = self.child.start_kill();
                let status = self
                    .child
                    .wait()
                    .await
                    .map_or(UNKNOWN_STATUS, exit_code);
                (status, Some(CommandError::interrupted(reason)))
            }
        };
        self.state.advance(WaitState::Exited);

        // Past the grace period the drain stays detached and the log gets
        // whatever was captured so far.
        if let Some(drain) = self.drain.take() {
            if failure.is_none()
                && tokio::time::timeout(STDERR_GRACE, drain.join()).await.is_err()
            {
                debug!(command = %self.command, "Error stream still open after exit");
            }
        }

        if let Some(sink) = &self.log_sink {
            sink.record(&LogEntry::Stage(StageRecord {
                command: self.command.clone(),
                elevated: self.invocation.elevated,
                chroot_dir: self.invocation.chroot_dir.clone(),
                status,
                stderr: String::from_utf8_lossy(&self.stderr.contents()).into_owned(),
                finished_at: Utc::now(),
            }));
        }

        if let Some(failure) = failure {
            return Err(failure);
        }
        if !self.accepted.contains(&status) && !self.ignore_error_status {
            return Err(CommandError::exit_status(self.command, status));
        }
        Ok(status)
    }
}

fn reason_of(token: Option<&CancellationToken>) -> String {
    token
        .and_then(CancellationToken::reason)
        .unwrap_or_else(|| "cancelled".to_string())
}

/// Maps an exit status to an integer code; signals map to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    UNKNOWN_STATUS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MemoryLogSink, MockLogSink};

    fn invocation(argv: &[&str]) -> Invocation {
        Invocation {
            argv: argv.iter().map(|s| (*s).to_string()).collect(),
            working_dir: None,
            elevated: false,
            chroot_dir: None,
        }
    }

    fn accepted() -> BTreeSet<i32> {
        BTreeSet::from([0])
    }

    #[tokio::test]
    async fn test_empty_argv_is_launch_failure() {
        let err = spawn_stage(String::new(), invocation(&[]), accepted(), &ExecutionContext::new())
            .unwrap_err();
        assert!(err.is_launch_failure());
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_failure() {
        let err = spawn_stage(
            "definitely-not-a-real-program-4711".to_string(),
            invocation(&["definitely-not-a-real-program-4711"]),
            accepted(),
            &ExecutionContext::new(),
        )
        .unwrap_err();
        assert!(err.is_launch_failure());
    }

    #[tokio::test]
    async fn test_stderr_is_logged_with_status() {
        let sink = Arc::new(MemoryLogSink::new());
        let ctx = ExecutionContext::new().with_log_sink(sink.clone());
        let handle = spawn_stage(
            "sh -c 'echo oops >&2; exit 3'".to_string(),
            invocation(&["sh", "-c", "echo oops >&2; exit 3"]),
            BTreeSet::from([0, 3]),
            &ctx,
        )
        .unwrap();

        assert_eq!(handle.wait().await.unwrap(), 3);
        assert_eq!(handle.waiter().state(), WaitState::ValidatedOk);

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        match &entries[0] {
            LogEntry::Stage(record) => {
                assert_eq!(record.status, 3);
                assert_eq!(record.stderr, "oops\n");
            }
            LogEntry::Pipeline(_) => panic!("expected a stage record"),
        }
    }

    #[tokio::test]
    async fn test_each_wait_logs_once() {
        let mut mock = MockLogSink::new();
        mock.expect_record()
            .withf(|entry| {
                matches!(entry, LogEntry::Stage(record) if record.command == "true" && record.status == 0)
            })
            .times(1)
            .return_const(());
        let ctx = ExecutionContext::new().with_log_sink(Arc::new(mock));

        let handle = spawn_stage("true".to_string(), invocation(&["true"]), accepted(), &ctx)
            .unwrap();
        assert_eq!(handle.wait().await.unwrap(), 0);
        assert_eq!(handle.wait().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_background_descendant_does_not_hold_waiter() {
        let sink = Arc::new(MemoryLogSink::new());
        let ctx = ExecutionContext::new().with_log_sink(sink.clone());
        let handle = spawn_stage(
            "daemonize".to_string(),
            invocation(&["sh", "-c", "echo started >&2; sleep 5 >/dev/null </dev/null & exit 0"]),
            accepted(),
            &ctx,
        )
        .unwrap();

        let status = tokio::time::timeout(Duration::from_secs(3), handle.wait())
            .await
            .expect("waiter blocked on the descendant's error stream")
            .unwrap();
        assert_eq!(status, 0);
        assert!(sink.text().contains("started"));
    }

    #[tokio::test]
    async fn test_verbose_stderr_does_not_block() {
        // Far more than a pipe buffer's worth of diagnostics.
        let handle = spawn_stage(
            "noisy".to_string(),
            invocation(&["sh", "-c", "head -c 1000000 /dev/zero >&2"]),
            accepted(),
            &ExecutionContext::new(),
        )
        .unwrap();
        assert_eq!(handle.wait().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_signal_exit_code() {
        let handle = spawn_stage(
            "self-kill".to_string(),
            invocation(&["sh", "-c", "kill -9 $$"]),
            accepted(),
            &ExecutionContext::new(),
        )
        .unwrap();
        assert_eq!(handle.wait().await.unwrap_err().status(), Some(137));
    }

    #[tokio::test]
    async fn test_abort_kills_and_interrupts() {
        let handle = spawn_stage(
            "sleep 30".to_string(),
            invocation(&["sleep", "30"]),
            accepted(),
            &ExecutionContext::new(),
        )
        .unwrap();

        handle.abort("launch of a later stage failed");
        let err = tokio::time::timeout(Duration::from_secs(10), handle.wait())
            .await
            .expect("abort did not terminate the process")
            .unwrap_err();
        assert!(err.is_interrupted());
        assert!(err.to_string().contains("launch of a later stage failed"));
    }
}
