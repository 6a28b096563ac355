//! # cmdpipe
//!
//! Run external commands and shell-style pipelines from async Rust.
//!
//! cmdpipe provides:
//!
//! - **Commands**: an argument-vector builder with per-command elevation,
//!   chroot and working-directory overrides
//! - **Pipelines**: stages wired output-to-input by concurrent relays, with
//!   one aggregated exit verdict
//! - **Run operations**: collect output as bytes, text, lines, NUL-separated
//!   fields or an integer, or stream it into a file or any writer
//! - **Run logs**: one structured record per stage, serialized across
//!   concurrent stages
//! - **Cancellation**: interrupt every process of a run on demand or after a
//!   timeout
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cmdpipe::prelude::*;
//!
//! let mut ctx = ExecutionContext::new();
//! ctx.begin_sudo();
//!
//! let partitions = Command::new("lsblk")
//!     .args(["-n", "-o", "NAME"])
//!     .pipe(Command::new("grep").arg("sda"))
//!     .run_lines(&ctx)
//!     .await?;
//!
//! Mkdir::new("/mnt/target").create_parents().run_noout(&ctx).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod catalog;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod process;
pub mod runner;
pub mod stages;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::catalog::{Cat, Cp, Dd, Mkdir, Mount, Mv, Rm, Rmdir, Umount};
    pub use crate::context::{ContextConfig, ExecutionContext};
    pub use crate::core::WaitState;
    pub use crate::errors::{CommandError, Result};
    pub use crate::events::{
        LogEntry, LogSink, MemoryLogSink, TracingLogSink, WriterLogSink,
    };
    pub use crate::pipeline::Pipeline;
    pub use crate::process::ProcessHandle;
    pub use crate::runner::RunExt;
    pub use crate::stages::{Command, ElevationOverride, PathOverride, Runnable, ToCommand};
}
