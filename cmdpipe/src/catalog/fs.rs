//! File and directory commands.

use super::path_arg;
use crate::stages::{Command, ToCommand};
use std::path::PathBuf;

/// `cat [file...]`; without files it copies its input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cat {
    files: Vec<PathBuf>,
}

impl Cat {
    /// Creates a `cat` of its input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `cat` of one file.
    #[must_use]
    pub fn of(file: impl Into<PathBuf>) -> Self {
        Self::new().file(file)
    }

    /// Appends a file to concatenate.
    #[must_use]
    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.files.push(file.into());
        self
    }
}

impl ToCommand for Cat {
    fn to_command(&self) -> Command {
        Command::new("cat").args(self.files.iter().map(|f| path_arg(f)))
    }
}

/// `cp [-r] [--preserve=all] source destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cp {
    source: PathBuf,
    destination: PathBuf,
    recursive: bool,
    preserve_all_attributes: bool,
}

impl Cp {
    /// Copies `source` to `destination`.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            recursive: false,
            preserve_all_attributes: false,
        }
    }

    /// Copies directories recursively.
    #[must_use]
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Preserves mode, ownership, timestamps and every other attribute.
    #[must_use]
    pub fn preserve_all_attributes(mut self) -> Self {
        self.preserve_all_attributes = true;
        self
    }
}

impl ToCommand for Cp {
    fn to_command(&self) -> Command {
        let mut command = Command::new("cp");
        if self.recursive {
            command = command.switch("r");
        }
        if self.preserve_all_attributes {
            command = command.long_switch_equal("preserve", "all");
        }
        command
            .trailing_arg(path_arg(&self.source))
            .trailing_arg(path_arg(&self.destination))
    }
}

/// `mkdir [-p] dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mkdir {
    dir: PathBuf,
    create_parents: bool,
}

impl Mkdir {
    /// Creates `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            create_parents: false,
        }
    }

    /// Creates missing parents too; an existing directory is not an error.
    #[must_use]
    pub fn create_parents(mut self) -> Self {
        self.create_parents = true;
        self
    }
}

impl ToCommand for Mkdir {
    fn to_command(&self) -> Command {
        let command = Command::new("mkdir").trailing_arg(path_arg(&self.dir));
        if self.create_parents {
            command.switch("p")
        } else {
            command
        }
    }
}

/// `mv source destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mv {
    source: PathBuf,
    destination: PathBuf,
}

impl Mv {
    /// Moves `source` to `destination`.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl ToCommand for Mv {
    fn to_command(&self) -> Command {
        Command::new("mv")
            .trailing_arg(path_arg(&self.source))
            .trailing_arg(path_arg(&self.destination))
    }
}

/// `rm [-r] target`.
///
/// The target is passed verbatim, so it may be a glob only when the command
/// runs through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rm {
    target: String,
    recursive: bool,
}

impl Rm {
    /// Removes `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::target(path_arg(&path.into()))
    }

    /// Removes `target` given as a raw argument.
    #[must_use]
    pub fn target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            recursive: false,
        }
    }

    /// Removes directories and their contents.
    #[must_use]
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }
}

impl ToCommand for Rm {
    fn to_command(&self) -> Command {
        let command = Command::new("rm").trailing_arg(self.target.clone());
        if self.recursive {
            command.switch("r")
        } else {
            command
        }
    }
}

/// `rmdir dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rmdir {
    dir: PathBuf,
}

impl Rmdir {
    /// Removes the empty directory `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ToCommand for Rmdir {
    fn to_command(&self) -> Command {
        Command::new("rmdir").trailing_arg(path_arg(&self.dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use crate::runner::RunExt;
    use crate::stages::Runnable;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rendering() {
        assert_eq!(Cat::new().describe(), "cat");
        assert_eq!(Cat::of("/a").file("/b").describe(), "cat /a /b");
        assert_eq!(Cp::new("/a", "/b").describe(), "cp /a /b");
        assert_eq!(
            Cp::new("/a", "/b")
                .preserve_all_attributes()
                .recursive()
                .describe(),
            "cp -r --preserve=all /a /b"
        );
        assert_eq!(Mkdir::new("/x/y").create_parents().describe(), "mkdir -p /x/y");
        assert_eq!(Mv::new("/a", "/b").describe(), "mv /a /b");
        assert_eq!(Rm::new("/a").recursive().describe(), "rm -r /a");
        assert_eq!(Rm::target("*.log").describe(), "rm *.log");
        assert_eq!(Rmdir::new("/a").describe(), "rmdir /a");
    }

    #[test]
    fn test_overrides_apply_to_rendered_command() {
        let invocation = Mkdir::new("/boot")
            .to_command()
            .chroot("/mnt/target")
            .resolve(&ExecutionContext::new());
        assert_eq!(
            invocation.argv,
            ["sudo", "chroot", "/mnt/target", "mkdir", "/boot"]
        );
    }

    #[tokio::test]
    async fn test_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ExecutionContext::new();
        let nested = dir.path().join("a").join("b");
        let source = dir.path().join("source.txt");
        let copy = nested.join("copy.txt");
        let moved = dir.path().join("moved.txt");
        std::fs::write(&source, "payload").unwrap();

        Mkdir::new(&nested).create_parents().run_noout(&ctx).await.unwrap();
        Cp::new(&source, &copy).run_noout(&ctx).await.unwrap();
        assert_eq!(Cat::of(&copy).run_str(&ctx).await.unwrap(), "payload");

        Mv::new(&copy, &moved).run_noout(&ctx).await.unwrap();
        assert!(!copy.exists());
        assert_eq!(
            Cat::of(&source).file(&moved).run_str(&ctx).await.unwrap(),
            "payloadpayload"
        );

        Rm::new(&moved).run_noout(&ctx).await.unwrap();
        Rmdir::new(&nested).run_noout(&ctx).await.unwrap();
        assert!(!nested.exists());
        Rm::new(dir.path().join("a")).recursive().run_noout(&ctx).await.unwrap();
        assert!(!dir.path().join("a").exists());
    }

    #[tokio::test]
    async fn test_failing_command_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ExecutionContext::new();
        let err = Rmdir::new(dir.path().join("missing"))
            .run_noout(&ctx)
            .await
            .unwrap_err();
        assert!(err.status().is_some_and(|code| code != 0));
    }
}
