//! Log sink trait and implementations.

use super::LogEntry;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::io::Write;
use tracing::{info, warn};

/// Trait for destinations of run log records.
///
/// Sinks are shared by every stage of a run and may be called from several
/// tasks at once. Implementations must deliver each entry as one group that
/// never interleaves with another entry. Recording never fails the run.
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync + fmt::Debug {
    /// Records one entry.
    fn record(&self, entry: &LogEntry);
}

/// A sink writing rendered text blocks to any [`Write`] destination.
///
/// Each entry is rendered first and written with a single `write_all`
/// while holding the lock, followed by a flush.
pub struct WriterLogSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterLogSink {
    /// Creates a sink over the given writer.
    #[must_use]
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Creates a sink writing to standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl fmt::Debug for WriterLogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterLogSink").finish_non_exhaustive()
    }
}

impl LogSink for WriterLogSink {
    fn record(&self, entry: &LogEntry) {
        let block = entry.render();
        let mut writer = self.writer.lock();
        if let Err(e) = writer.write_all(block.as_bytes()).and_then(|()| writer.flush()) {
            warn!(error = %e, command = %entry.command(), "Failed to write log entry");
        }
    }
}

/// A sink that forwards entries to `tracing` as structured events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn record(&self, entry: &LogEntry) {
        match entry {
            LogEntry::Stage(record) => {
                info!(
                    command = %record.command,
                    status = record.status,
                    elevated = record.elevated,
                    entry = %entry.to_json(),
                    "Command finished"
                );
            }
            LogEntry::Pipeline(record) => {
                info!(
                    run_id = %record.run_id,
                    command = %record.command,
                    stages = record.stages,
                    "Pipeline collecting"
                );
            }
        }
    }
}

/// A collecting sink, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: RwLock<Vec<LogEntry>>,
}

impl MemoryLogSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected entries.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    /// Returns the number of collected entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the concatenated text rendering of all entries.
    #[must_use]
    pub fn text(&self) -> String {
        self.entries.read().iter().map(LogEntry::render).collect()
    }
}

impl LogSink for MemoryLogSink {
    fn record(&self, entry: &LogEntry) {
        self.entries.write().push(entry.clone());
    }
}
