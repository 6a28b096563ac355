//! A single external command.

use super::overrides::{ElevationOverride, Invocation, PathOverride};
use super::Runnable;
use crate::context::ExecutionContext;
use crate::errors::Result;
use crate::pipeline::Pipeline;
use crate::process::{spawn_stage, ProcessHandle};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// One executable plus its arguments and per-command settings.
///
/// Arguments are kept in two lists: the regular argument vector and the
/// trailing arguments, which always come last regardless of when they were
/// added (typically source and destination paths).
///
/// ```rust,ignore
/// let status = Command::new("cp")
///     .trailing_arg("/etc/hosts")
///     .trailing_arg("/tmp/hosts")
///     .switch("r")
///     .long_switch_equal("preserve", "all")
///     .elevate()
///     .run_noout(&ctx)
///     .await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
    trailing: Vec<String>,
    elevation: ElevationOverride,
    chroot: PathOverride,
    working_dir: PathOverride,
    accepted: BTreeSet<i32>,
    input: Option<Vec<u8>>,
}

impl Command {
    /// Creates a command running `program`. Exit code 0 is accepted.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self::from_argv([program.into()])
    }

    /// Creates a command from a full argument vector (program first).
    #[must_use]
    pub fn from_argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            trailing: Vec::new(),
            elevation: ElevationOverride::Inherit,
            chroot: PathOverride::Inherit,
            working_dir: PathOverride::Inherit,
            accepted: BTreeSet::from([0]),
            input: None,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends `-name`.
    #[must_use]
    pub fn switch(self, name: &str) -> Self {
        self.arg(format!("-{name}"))
    }

    /// Appends `-name` followed by its parameters.
    #[must_use]
    pub fn switch_args<I, S>(self, name: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.switch(name).args(params)
    }

    /// Appends `--name`.
    #[must_use]
    pub fn long_switch(self, name: &str) -> Self {
        self.arg(format!("--{name}"))
    }

    /// Appends `--name` followed by its parameters.
    #[must_use]
    pub fn long_switch_args<I, S>(self, name: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.long_switch(name).args(params)
    }

    /// Appends `key=value`.
    #[must_use]
    pub fn equal(self, key: &str, value: impl fmt::Display) -> Self {
        self.arg(format!("{key}={value}"))
    }

    /// Appends `-name=value`.
    #[must_use]
    pub fn switch_equal(self, name: &str, value: impl fmt::Display) -> Self {
        self.arg(format!("-{name}={value}"))
    }

    /// Appends `--name=value`.
    #[must_use]
    pub fn long_switch_equal(self, name: &str, value: impl fmt::Display) -> Self {
        self.arg(format!("--{name}={value}"))
    }

    /// Appends an argument that always stays after every other argument.
    #[must_use]
    pub fn trailing_arg(mut self, arg: impl Into<String>) -> Self {
        self.trailing.push(arg.into());
        self
    }

    /// Always runs this command elevated.
    #[must_use]
    pub fn elevate(mut self) -> Self {
        self.elevation = ElevationOverride::Enabled;
        self
    }

    /// Never runs this command elevated (a chroot still elevates).
    #[must_use]
    pub fn no_elevation(mut self) -> Self {
        self.elevation = ElevationOverride::Disabled;
        self
    }

    /// Runs this command inside `dir`.
    #[must_use]
    pub fn chroot(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chroot = PathOverride::Set(dir.into());
        self
    }

    /// Runs this command outside any chroot.
    #[must_use]
    pub fn no_chroot(mut self) -> Self {
        self.chroot = PathOverride::Disabled;
        self
    }

    /// Runs this command from `dir`.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = PathOverride::Set(dir.into());
        self
    }

    /// Runs this command from the caller's working directory.
    #[must_use]
    pub fn no_working_dir(mut self) -> Self {
        self.working_dir = PathOverride::Disabled;
        self
    }

    /// Treats `status` as success in addition to the already accepted codes.
    #[must_use]
    pub fn accept_status(mut self, status: i32) -> Self {
        self.accepted.insert(status);
        self
    }

    /// Sets the bytes fed to the command's input; replaces earlier input.
    #[must_use]
    pub fn input(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.input = Some(data.into());
        self
    }

    /// Chains `next` after this command.
    #[must_use]
    pub fn pipe(self, next: impl Runnable + 'static) -> Pipeline {
        Pipeline::new(self).stage(next)
    }

    /// Chains a command built from `argv` after this command.
    #[must_use]
    pub fn pipe_argv<I, S>(self, argv: I) -> Pipeline
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pipe(Self::from_argv(argv))
    }

    /// Returns the regular argument vector, program first.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Returns the trailing arguments.
    #[must_use]
    pub fn trailing_args(&self) -> &[String] {
        &self.trailing
    }

    /// Returns the elevation override.
    #[must_use]
    pub fn elevation_override(&self) -> ElevationOverride {
        self.elevation
    }

    /// Returns the chroot override.
    #[must_use]
    pub fn chroot_override(&self) -> &PathOverride {
        &self.chroot
    }

    /// Returns the working directory override.
    #[must_use]
    pub fn working_dir_override(&self) -> &PathOverride {
        &self.working_dir
    }

    /// Returns the accepted exit codes.
    #[must_use]
    pub fn accepted_statuses(&self) -> &BTreeSet<i32> {
        &self.accepted
    }

    /// Resolves the final invocation against the context defaults.
    ///
    /// The per-command override wins over the context. Elevation prefixes
    /// the vector with the elevation command; a chroot adds the elevation
    /// command, the chroot program and the directory, so a chroot always
    /// elevates even when elevation is disabled for the command.
    #[must_use]
    pub fn resolve(&self, ctx: &ExecutionContext) -> Invocation {
        let elevated = self.elevation.resolve(ctx.is_sudo());
        let chroot_dir = self.chroot.resolve(ctx.chroot_dir());
        let working_dir = self.working_dir.resolve(ctx.working_dir());

        let mut argv = Vec::new();
        if elevated {
            argv.extend(ctx.elevation_command().iter().cloned());
        }
        if let Some(dir) = &chroot_dir {
            argv.extend(ctx.elevation_command().iter().cloned());
            argv.push(ctx.chroot_command().to_string());
            argv.push(dir.to_string_lossy().into_owned());
        }
        argv.extend(self.argv.iter().cloned());
        argv.extend(self.trailing.iter().cloned());

        Invocation {
            argv,
            working_dir,
            elevated,
            chroot_dir,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<&str> = self
            .argv
            .iter()
            .chain(&self.trailing)
            .map(String::as_str)
            .collect();
        write!(f, "{}", words.join(" "))
    }
}

#[async_trait]
impl Runnable for Command {
    fn describe(&self) -> String {
        self.to_string()
    }

    fn input(&self) -> Option<&[u8]> {
        self.input.as_deref()
    }

    async fn spawn(&self, ctx: &ExecutionContext) -> Result<ProcessHandle> {
        spawn_stage(
            self.to_string(),
            self.resolve(ctx),
            self.accepted.clone(),
            ctx,
        )
    }
}
