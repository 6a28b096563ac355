//! Mounting and unmounting filesystems.
//!
//! Both commands usually need privileges; elevate the rendered command or
//! run them from an elevated context.

use super::path_arg;
use crate::stages::{Command, ToCommand};
use std::path::PathBuf;

/// `mount [-t type] [-o option]... source target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    source: String,
    target: PathBuf,
    fs_type: Option<String>,
    options: Vec<String>,
}

impl Mount {
    /// Mounts the device or file at `source` on `target`.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self::named(path_arg(&source.into()), target)
    }

    /// Mounts a named source such as `proc` or `tmpfs` on `target`.
    #[must_use]
    pub fn named(source: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            fs_type: None,
            options: Vec::new(),
        }
    }

    /// Sets the filesystem type (`-t`).
    #[must_use]
    pub fn fs_type(mut self, fs_type: impl Into<String>) -> Self {
        self.fs_type = Some(fs_type.into());
        self
    }

    /// Adds `-o bind`.
    #[must_use]
    pub fn bind(self) -> Self {
        self.option("bind")
    }

    /// Adds `-o loop`.
    #[must_use]
    pub fn loop_device(self) -> Self {
        self.option("loop")
    }

    /// Adds `-o option`.
    #[must_use]
    pub fn option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }
}

impl ToCommand for Mount {
    fn to_command(&self) -> Command {
        let mut command = Command::new("mount");
        if let Some(fs_type) = &self.fs_type {
            command = command.switch_args("t", [fs_type.as_str()]);
        }
        for option in &self.options {
            command = command.switch_args("o", [option.as_str()]);
        }
        command
            .trailing_arg(self.source.clone())
            .trailing_arg(path_arg(&self.target))
    }
}

/// `umount target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Umount {
    target: PathBuf,
}

impl Umount {
    /// Unmounts the filesystem mounted on `target`.
    #[must_use]
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl ToCommand for Umount {
    fn to_command(&self) -> Command {
        Command::new("umount").trailing_arg(path_arg(&self.target))
    }
}
