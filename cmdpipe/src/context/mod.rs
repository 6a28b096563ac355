//! Execution context shared by every stage of a run.
//!
//! - [`ExecutionContext`] holds the run-wide defaults (elevation, chroot,
//!   working directory, status checking) plus the log sink and an optional
//!   cancellation token.
//! - [`ContextConfig`] is its serializable form.

mod config;
mod execution;

pub use config::ContextConfig;
pub use execution::ExecutionContext;
