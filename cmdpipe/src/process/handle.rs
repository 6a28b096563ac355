//! Handles to spawned units and their one-shot waiters.

use crate::cancellation::CancellationToken;
use crate::core::status::AtomicWaitState;
use crate::core::WaitState;
use crate::errors::Result;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;

/// Writable end feeding a unit's input.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Readable end delivering a unit's output.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

enum Slot {
    Pending(BoxFuture<'static, Result<i32>>),
    Done(Result<i32>),
}

/// Deferred result of a spawned unit.
///
/// The first call to [`wait`](Self::wait) drives the unit to completion:
/// it blocks until the process (or every stage of a pipeline) has exited,
/// writes the log record and validates the exit status. Later calls return
/// the cached result. Concurrent callers are serialized.
pub struct Waiter {
    label: String,
    state: Arc<AtomicWaitState>,
    slot: Mutex<Slot>,
}

impl Waiter {
    pub(crate) fn new(
        label: impl Into<String>,
        state: Arc<AtomicWaitState>,
        future: BoxFuture<'static, Result<i32>>,
    ) -> Self {
        Self {
            label: label.into(),
            state,
            slot: Mutex::new(Slot::Pending(future)),
        }
    }

    /// Waits for the unit to terminate and returns its exit code.
    pub async fn wait(&self) -> Result<i32> {
        let mut slot = self.slot.lock().await;
        let result = match &mut *slot {
            Slot::Done(result) => return result.clone(),
            Slot::Pending(future) => future.await,
        };

        self.state.advance(if result.is_ok() {
            WaitState::ValidatedOk
        } else {
            WaitState::ValidatedFailed
        });
        *slot = Slot::Done(result.clone());
        result
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WaitState {
        self.state.load()
    }

    /// Returns the command line this waiter belongs to.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("label", &self.label)
            .field("state", &self.state())
            .finish()
    }
}

/// The live view of one spawned unit: a single process or a whole pipeline.
///
/// The input and output ends can be taken once each; whatever has not been
/// taken is closed when the handle is dropped.
pub struct ProcessHandle {
    stdin: Option<BoxedWriter>,
    stdout: Option<BoxedReader>,
    waiter: Waiter,
    aborts: Vec<Arc<CancellationToken>>,
}

impl ProcessHandle {
    pub(crate) fn new(
        stdin: Option<BoxedWriter>,
        stdout: Option<BoxedReader>,
        waiter: Waiter,
        aborts: Vec<Arc<CancellationToken>>,
    ) -> Self {
        Self {
            stdin,
            stdout,
            waiter,
            aborts,
        }
    }

    /// Returns the command line of the unit.
    #[must_use]
    pub fn label(&self) -> &str {
        self.waiter.label()
    }

    /// Takes the writable end of the unit's input.
    pub fn take_stdin(&mut self) -> Option<BoxedWriter> {
        self.stdin.take()
    }

    /// Takes the readable end of the unit's output.
    pub fn take_stdout(&mut self) -> Option<BoxedReader> {
        self.stdout.take()
    }

    /// Closes whichever ends have not been taken.
    pub fn close_streams(&mut self) {
        self.stdin = None;
        self.stdout = None;
    }

    /// Returns the waiter.
    #[must_use]
    pub fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Consumes the handle, closing untaken ends, and returns the waiter.
    #[must_use]
    pub fn into_waiter(self) -> Waiter {
        self.waiter
    }

    /// Waits for the unit; see [`Waiter::wait`].
    pub async fn wait(&self) -> Result<i32> {
        self.waiter.wait().await
    }

    /// Kills every process of the unit.
    ///
    /// The waiter still has to be consulted to reap the processes; it then
    /// fails with an interruption carrying `reason`.
    pub fn abort(&self, reason: &str) {
        for token in &self.aborts {
            token.cancel(reason);
        }
    }

    pub(crate) fn abort_tokens(&self) -> &[Arc<CancellationToken>] {
        &self.aborts
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("label", &self.label())
            .field("stdin", &self.stdin.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("state", &self.waiter.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CommandError;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_waiter(counter: Arc<AtomicUsize>, result: Result<i32>) -> Waiter {
        let state = Arc::new(AtomicWaitState::new(WaitState::Spawned));
        Waiter::new(
            "test",
            state,
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                result
            }
            .boxed(),
        )
    }

    #[tokio::test]
    async fn test_waiter_runs_once_and_caches() {
        let counter = Arc::new(AtomicUsize::new(0));
        let waiter = counting_waiter(counter.clone(), Ok(3));
        assert_eq!(waiter.state(), WaitState::Spawned);

        assert_eq!(waiter.wait().await.unwrap(), 3);
        assert_eq!(waiter.wait().await.unwrap(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(waiter.state(), WaitState::ValidatedOk);
    }

    #[tokio::test]
    async fn test_waiter_caches_errors() {
        let counter = Arc::new(AtomicUsize::new(0));
        let waiter = counting_waiter(counter.clone(), Err(CommandError::exit_status("false", 1)));

        assert_eq!(waiter.wait().await.unwrap_err().status(), Some(1));
        assert_eq!(waiter.wait().await.unwrap_err().status(), Some(1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(waiter.state(), WaitState::ValidatedFailed);
    }

    #[tokio::test]
    async fn test_handle_streams_taken_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (a, b) = tokio::io::duplex(8);
        let mut handle = ProcessHandle::new(
            Some(Box::new(a)),
            Some(Box::new(b)),
            counting_waiter(counter, Ok(0)),
            vec![Arc::new(CancellationToken::new())],
        );

        assert!(handle.take_stdin().is_some());
        assert!(handle.take_stdin().is_none());
        assert!(handle.take_stdout().is_some());
        assert!(handle.take_stdout().is_none());
        assert_eq!(handle.label(), "test");
    }

    #[tokio::test]
    async fn test_abort_cancels_every_token() {
        let counter = Arc::new(AtomicUsize::new(0));
        let tokens = vec![
            Arc::new(CancellationToken::new()),
            Arc::new(CancellationToken::new()),
        ];
        let handle = ProcessHandle::new(None, None, counting_waiter(counter, Ok(0)), tokens.clone());

        handle.abort("stop");
        assert!(tokens.iter().all(|t| t.reason().as_deref() == Some("stop")));
        assert_eq!(handle.abort_tokens().len(), 2);
    }
}
