//! The shared run engine behind every terminal operation.

use crate::context::ExecutionContext;
use crate::errors::{CommandError, Result};
use crate::observability::RunTimer;
use crate::process::{join_relays, ProcessHandle, StreamRelay};
use crate::stages::Runnable;
use std::io::Cursor;
use tokio::io::AsyncWrite;
use tracing::debug;

/// Runs `unit` to completion, relaying its output into `sink`.
///
/// The unit's configured input (if any) is relayed into its input stream;
/// otherwise the input stream is closed right away so that programs reading
/// it see end-of-data. Both relays run concurrently with the unit's own
/// inter-stage relays and are joined before the waiter is consulted. The
/// waiter is always consulted, so every process is reaped and logged. A
/// relay failure is reported ahead of its verdict unless the verdict is an
/// interruption.
///
/// # Errors
///
/// Launch, relay, exit-status and interruption failures.
pub async fn execute<U, W>(unit: &U, ctx: &ExecutionContext, sink: W) -> Result<i32>
where
    U: Runnable + ?Sized,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut handle: ProcessHandle = unit.spawn(ctx).await?;
    let timer = RunTimer::start(handle.label());
    let cancel = ctx.cancellation().cloned();

    let mut relays = Vec::with_capacity(2);
    let stdin = handle.take_stdin();
    match (unit.input(), stdin) {
        (Some(data), Some(stdin)) => relays.push(StreamRelay::start(
            format!("input of '{}'", timer.label()),
            Cursor::new(data.to_vec()),
            stdin,
            cancel.clone(),
        )),
        (_, stdin) => drop(stdin),
    }
    if let Some(stdout) = handle.take_stdout() {
        relays.push(StreamRelay::start(
            format!("output of '{}'", timer.label()),
            stdout,
            sink,
            cancel,
        ));
    }

    let broken = join_relays(relays).await;
    let waiter = handle.into_waiter();
    let verdict = waiter.wait().await;
    debug!(
        command = %timer.label(),
        elapsed_ms = timer.elapsed_ms(),
        verdict = ?verdict,
        "Run finished"
    );

    let interrupted = matches!(&verdict, Err(e) if e.is_interrupted());
    if !broken.is_empty() && !interrupted {
        return Err(CommandError::relay(broken.join(", ")));
    }
    verdict
}
