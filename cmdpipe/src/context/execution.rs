//! The per-run execution context.

use crate::cancellation::CancellationToken;
use crate::events::LogSink;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default prefix used to run a process with elevated privileges.
pub const DEFAULT_ELEVATION_COMMAND: &str = "sudo";

/// Default program used to enter a chroot.
pub const DEFAULT_CHROOT_COMMAND: &str = "chroot";

/// Run-wide configuration read by every stage of a run.
///
/// The context is shared by reference across all stages of one invocation.
/// It must not be mutated while a run that uses it is still in flight; the
/// `begin_*`/`end_*` mutators are meant to bracket whole runs.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    log_sink: Option<Arc<dyn LogSink>>,
    ignore_error_status: bool,
    elevate: bool,
    chroot_dir: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    elevation_command: Vec<String>,
    chroot_command: String,
    cancellation: Option<Arc<CancellationToken>>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            log_sink: None,
            ignore_error_status: false,
            elevate: false,
            chroot_dir: None,
            working_dir: None,
            elevation_command: vec![DEFAULT_ELEVATION_COMMAND.to_string()],
            chroot_command: DEFAULT_CHROOT_COMMAND.to_string(),
            cancellation: None,
        }
    }
}

impl ExecutionContext {
    /// Creates a context with no log sink and all settings off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log sink.
    #[must_use]
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Sets the cancellation token observed by every relay and waiter.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Sets the argument prefix used for elevation (default `sudo`).
    #[must_use]
    pub fn with_elevation_command<I, S>(mut self, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elevation_command = prefix.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the program used to enter a chroot (default `chroot`).
    #[must_use]
    pub fn with_chroot_command(mut self, program: impl Into<String>) -> Self {
        self.chroot_command = program.into();
        self
    }

    /// Replaces or clears the log sink.
    pub fn set_log_sink(&mut self, sink: Option<Arc<dyn LogSink>>) {
        self.log_sink = sink;
    }

    /// Stops exit status validation.
    pub fn begin_ignore_error_status(&mut self) {
        self.ignore_error_status = true;
    }

    /// Resumes exit status validation.
    pub fn end_ignore_error_status(&mut self) {
        self.ignore_error_status = false;
    }

    /// Runs subsequent commands elevated by default.
    pub fn begin_sudo(&mut self) {
        self.elevate = true;
    }

    /// Stops elevating by default.
    pub fn end_sudo(&mut self) {
        self.elevate = false;
    }

    /// Runs subsequent commands inside `dir` by default.
    pub fn begin_chroot(&mut self, dir: impl Into<PathBuf>) {
        self.chroot_dir = Some(dir.into());
    }

    /// Stops the default chroot.
    pub fn end_chroot(&mut self) {
        self.chroot_dir = None;
    }

    /// Runs subsequent commands from `dir` by default.
    pub fn begin_working_dir(&mut self, dir: impl Into<PathBuf>) {
        self.working_dir = Some(dir.into());
    }

    /// Returns to inheriting the caller's working directory.
    pub fn end_working_dir(&mut self) {
        self.working_dir = None;
    }

    /// Returns the log sink, if any.
    #[must_use]
    pub fn log_sink(&self) -> Option<&Arc<dyn LogSink>> {
        self.log_sink.as_ref()
    }

    /// Returns whether exit status validation is suppressed.
    #[must_use]
    pub fn is_ignore_error_status(&self) -> bool {
        self.ignore_error_status
    }

    /// Returns the default elevation setting.
    #[must_use]
    pub fn is_sudo(&self) -> bool {
        self.elevate
    }

    /// Returns the default chroot directory.
    #[must_use]
    pub fn chroot_dir(&self) -> Option<&Path> {
        self.chroot_dir.as_deref()
    }

    /// Returns the default working directory.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Returns the elevation argument prefix.
    #[must_use]
    pub fn elevation_command(&self) -> &[String] {
        &self.elevation_command
    }

    /// Returns the chroot program.
    #[must_use]
    pub fn chroot_command(&self) -> &str {
        &self.chroot_command
    }

    /// Returns the cancellation token, if any.
    #[must_use]
    pub fn cancellation(&self) -> Option<&Arc<CancellationToken>> {
        self.cancellation.as_ref()
    }
}
