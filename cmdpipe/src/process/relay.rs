//! Byte relays between streams.

use crate::cancellation::{cancelled_or_never, CancellationToken};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Size of the copy buffer used by every relay.
pub const RELAY_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Copies all bytes from a source to a sink on its own task.
///
/// The copy ends at end-of-data, at the first read or write error, or when
/// the optional cancellation token fires. In every case both ends are closed
/// before the task finishes; errors raised while closing are ignored. There
/// is no retry.
#[derive(Debug)]
pub struct StreamRelay {
    label: String,
    handle: JoinHandle<bool>,
}

impl StreamRelay {
    /// Starts a relay. Must be called from within a tokio runtime.
    pub fn start<R, W>(
        label: impl Into<String>,
        source: R,
        sink: W,
        cancel: Option<Arc<CancellationToken>>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let label = label.into();
        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            let mut source = source;
            let mut sink = sink;

            let outcome = tokio::select! {
                copied = copy_all(&mut source, &mut sink) => copied,
                () = cancelled_or_never(cancel.as_deref()) => {
                    Err(io::Error::new(io::ErrorKind::Interrupted, "relay cancelled"))
                }
            };

            let _ = sink.shutdown().await;
            drop(sink);
            drop(source);

            match outcome {
                Ok(bytes) => {
                    trace!(relay = %task_label, bytes, "Relay finished");
                    true
                }
                Err(e) => {
                    warn!(relay = %task_label, error = %e, "Relay failed");
                    false
                }
            }
        });

        Self { label, handle }
    }

    /// Returns the relay label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Waits for the relay to finish and returns whether the copy succeeded.
    ///
    /// A relay task that panicked or was aborted counts as failed.
    pub async fn join(self) -> bool {
        match self.handle.await {
            Ok(success) => success,
            Err(e) => {
                warn!(relay = %self.label, error = %e, "Relay task did not complete");
                false
            }
        }
    }
}

/// Joins every relay and returns the labels of those that failed.
pub async fn join_relays(relays: Vec<StreamRelay>) -> Vec<String> {
    let joined = futures::future::join_all(relays.into_iter().map(|relay| async move {
        let label = relay.label.clone();
        (label, relay.join().await)
    }))
    .await;

    joined
        .into_iter()
        .filter(|(_, success)| !success)
        .map(|(label, _)| label)
        .collect()
}

async fn copy_all<R, W>(source: &mut R, sink: &mut W) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; RELAY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n]).await?;
        total += n as u64;
    }
    sink.flush().await?;
    Ok(total)
}
