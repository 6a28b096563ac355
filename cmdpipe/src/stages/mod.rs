//! Runnable units and the single-process [`Command`].
//!
//! Anything that can be spawned into a [`ProcessHandle`] implements
//! [`Runnable`]: a [`Command`], a [`Pipeline`](crate::pipeline::Pipeline),
//! and every [`ToCommand`] type from the catalog.

mod command;
mod overrides;

pub use command::Command;
pub use overrides::{ElevationOverride, Invocation, PathOverride};

use crate::context::ExecutionContext;
use crate::errors::Result;
use crate::process::ProcessHandle;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for units that can be spawned as one or more OS processes.
///
/// Spawning never blocks on the processes themselves: it returns as soon as
/// every process exists. Use the [`RunExt`](crate::runner::RunExt)
/// operations to run a unit to completion.
#[async_trait]
pub trait Runnable: Send + Sync + Debug {
    /// Returns the human-readable command line.
    fn describe(&self) -> String;

    /// Returns the bytes fed to the unit's input by the run operations.
    fn input(&self) -> Option<&[u8]> {
        None
    }

    /// Spawns the unit.
    ///
    /// # Errors
    ///
    /// Fails fast with a launch error if a process cannot be started; no
    /// partially started unit is left running.
    async fn spawn(&self, ctx: &ExecutionContext) -> Result<ProcessHandle>;
}

/// Capability of a concrete command wrapper: render itself as a [`Command`].
pub trait ToCommand {
    /// Returns the argument vector, trailing arguments and settings.
    fn to_command(&self) -> Command;
}

#[async_trait]
impl<T> Runnable for T
where
    T: ToCommand + Send + Sync + Debug,
{
    fn describe(&self) -> String {
        self.to_command().to_string()
    }

    async fn spawn(&self, ctx: &ExecutionContext) -> Result<ProcessHandle> {
        self.to_command().spawn(ctx).await
    }
}
