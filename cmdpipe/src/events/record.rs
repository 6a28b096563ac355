//! Structured log records and their text rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use uuid::Uuid;

const GROUP_DELIMITER: &str = "----------------------------\n";
const STDERR_DELIMITER: &str = "-------\n";

/// Record written when a single process has exited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    /// Command line without elevation/chroot prefixes.
    pub command: String,
    /// Whether the process ran elevated.
    pub elevated: bool,
    /// Chroot directory, if any.
    pub chroot_dir: Option<PathBuf>,
    /// Raw exit code.
    pub status: i32,
    /// Text captured from the process's error stream.
    pub stderr: String,
    /// When the exit was observed.
    pub finished_at: DateTime<Utc>,
}

/// Record written when a pipeline waiter is consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRecord {
    /// Identifier of this pipeline invocation.
    pub run_id: Uuid,
    /// Stage command lines joined with `" | "`.
    pub command: String,
    /// Number of stages.
    pub stages: usize,
    /// When collection started.
    pub started_at: DateTime<Utc>,
}

/// A single entry delivered to a [`LogSink`](super::LogSink).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEntry {
    /// A stage finished.
    Stage(StageRecord),
    /// A pipeline started collecting its stages.
    Pipeline(PipelineRecord),
}

impl LogEntry {
    /// Renders the entry as the plain text block written to log files.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from(GROUP_DELIMITER);
        match self {
            Self::Stage(record) => {
                let _ = writeln!(out, "  COMMAND: {}", record.command);
                if record.elevated {
                    out.push_str("  WITH SUDO\n");
                }
                if let Some(dir) = &record.chroot_dir {
                    let _ = writeln!(out, "  WITH CHROOT: {}", dir.display());
                }
                let _ = writeln!(out, "  RETURNS: {}", record.status);
                out.push_str(STDERR_DELIMITER);
                out.push_str(&record.stderr);
                out.push_str(STDERR_DELIMITER);
            }
            Self::Pipeline(record) => {
                let _ = writeln!(out, "PIPELINE: {}", record.command);
            }
        }
        out
    }

    /// Converts the entry to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Returns the command line named by the entry.
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Stage(record) => &record.command,
            Self::Pipeline(record) => &record.command,
        }
    }
}
