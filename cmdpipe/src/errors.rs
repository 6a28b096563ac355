//! Error types for cmdpipe.
//!
//! Every failure a run can produce is reported through [`CommandError`].
//! Only the exit-status variant carries the offending code as structured
//! data; the pipeline aggregate keeps the per-stage codes for diagnostics.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CommandError>;

/// The unified error type for command and pipeline execution.
///
/// The type is `Clone` so that a waiter can cache its verdict and replay it
/// on later consultations; I/O sources are shared through `Arc`.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// The operating system could not start the process.
    #[error("Could not start '{command}': {source}")]
    Launch {
        /// The command line that failed to start.
        command: String,
        /// The underlying spawn error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// An I/O error occurred while relaying data between streams.
    #[error("Broken pipe during relay: {detail}")]
    Relay {
        /// Which relay(s) failed.
        detail: String,
    },

    /// A process terminated with an exit code outside its accepted set.
    #[error("Invalid exit status {status} from '{command}'")]
    ExitStatus {
        /// The command line of the offending process or pipeline.
        command: String,
        /// The exit code returned by the process.
        status: i32,
    },

    /// One or more stages of a pipeline failed.
    #[error("One or more commands in the pipeline failed: {pipeline}")]
    StagesFailed {
        /// The pipeline command line.
        pipeline: String,
        /// Per-stage exit codes, `None` where no code could be observed.
        statuses: Vec<Option<i32>>,
    },

    /// Waiting for the process was interrupted.
    #[error("Interrupted: {reason}")]
    Interrupted {
        /// The cancellation reason.
        reason: String,
    },

    /// Waiting for process termination failed.
    #[error("Failed to wait for process: {source}")]
    Wait {
        /// The underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The destination file could not be opened.
    #[error("Output file not available: {}: {source}", path.display())]
    OutputFile {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Command output could not be parsed as an integer.
    #[error("Output is not a valid integer: '{text}'")]
    Parse {
        /// The trimmed output text.
        text: String,
        /// The underlying parse error.
        #[source]
        source: std::num::ParseIntError,
    },

    /// A pipeline was built without stages.
    #[error("A pipeline requires at least one stage")]
    EmptyPipeline,

    /// Configuration could not be loaded or applied.
    #[error("Configuration error: {detail}")]
    Config {
        /// What went wrong.
        detail: String,
    },
}

impl CommandError {
    /// Creates a launch error.
    #[must_use]
    pub fn launch(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            command: command.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a relay error.
    #[must_use]
    pub fn relay(detail: impl Into<String>) -> Self {
        Self::Relay {
            detail: detail.into(),
        }
    }

    /// Creates an exit status error.
    #[must_use]
    pub fn exit_status(command: impl Into<String>, status: i32) -> Self {
        Self::ExitStatus {
            command: command.into(),
            status,
        }
    }

    /// Creates an interruption error.
    #[must_use]
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }

    /// Creates a wait error.
    #[must_use]
    pub fn wait(source: std::io::Error) -> Self {
        Self::Wait {
            source: Arc::new(source),
        }
    }

    /// Creates an output file error.
    #[must_use]
    pub fn output_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputFile {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    /// Returns the offending exit code for exit-status failures.
    #[must_use]
    pub fn status(&self) -> Option<i32> {
        match self {
            Self::ExitStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the process could not be started.
    #[must_use]
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, Self::Launch { .. })
    }

    /// Returns true if a relay failed.
    #[must_use]
    pub fn is_relay_failure(&self) -> bool {
        matches!(self, Self::Relay { .. })
    }

    /// Returns true if the wait was interrupted.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}
