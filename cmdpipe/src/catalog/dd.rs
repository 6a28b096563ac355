//! Block copies with `dd`.

use super::path_arg;
use crate::stages::{Command, ToCommand};
use std::path::PathBuf;

/// `dd` with the operands it was configured with.
///
/// Without an input file `dd` reads its input; without an output file it
/// writes its output, so it can sit anywhere in a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dd {
    input_file: Option<PathBuf>,
    input_block_size: Option<u64>,
    input_skip_blocks: Option<u64>,
    input_blocks_count: Option<u64>,
    output_file: Option<PathBuf>,
    output_block_size: Option<u64>,
    output_seek_blocks: Option<u64>,
    append: bool,
}

impl Dd {
    /// Creates a `dd` copying its input to its output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads from `file` (`if=`).
    #[must_use]
    pub fn input_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.input_file = Some(file.into());
        self
    }

    /// Reads `bytes` at a time (`ibs=`).
    #[must_use]
    pub fn input_block_size(mut self, bytes: u64) -> Self {
        self.input_block_size = Some(bytes);
        self
    }

    /// Skips `count` input blocks (`skip=`).
    #[must_use]
    pub fn input_skip_blocks(mut self, count: u64) -> Self {
        self.input_skip_blocks = Some(count);
        self
    }

    /// Copies only `count` input blocks (`count=`).
    #[must_use]
    pub fn input_blocks_count(mut self, count: u64) -> Self {
        self.input_blocks_count = Some(count);
        self
    }

    /// Writes to `file` (`of=`).
    #[must_use]
    pub fn output_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.output_file = Some(file.into());
        self
    }

    /// Writes `bytes` at a time (`obs=`).
    #[must_use]
    pub fn output_block_size(mut self, bytes: u64) -> Self {
        self.output_block_size = Some(bytes);
        self
    }

    /// Skips `count` output blocks before writing (`seek=`).
    #[must_use]
    pub fn output_seek_blocks(mut self, count: u64) -> Self {
        self.output_seek_blocks = Some(count);
        self
    }

    /// Appends to the output file instead of truncating it
    /// (`conv=notrunc oflag=append`).
    #[must_use]
    pub fn append(mut self) -> Self {
        self.append = true;
        self
    }
}

impl ToCommand for Dd {
    fn to_command(&self) -> Command {
        let mut command = Command::new("dd");
        if let Some(file) = &self.input_file {
            command = command.equal("if", path_arg(file));
        }
        if let Some(bytes) = self.input_block_size {
            command = command.equal("ibs", bytes);
        }
        if let Some(count) = self.input_skip_blocks {
            command = command.equal("skip", count);
        }
        if let Some(count) = self.input_blocks_count {
            command = command.equal("count", count);
        }
        if let Some(file) = &self.output_file {
            command = command.equal("of", path_arg(file));
        }
        if let Some(bytes) = self.output_block_size {
            command = command.equal("obs", bytes);
        }
        if let Some(count) = self.output_seek_blocks {
            command = command.equal("seek", count);
        }
        if self.append {
            command = command.equal("conv", "notrunc").equal("oflag", "append");
        }
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use crate::runner::RunExt;
    use crate::stages::Runnable;

    #[test]
    fn test_rendering() {
        assert_eq!(Dd::new().describe(), "dd");
        assert_eq!(
            Dd::new()
                .input_file("/dev/sda")
                .input_block_size(512)
                .input_skip_blocks(1)
                .input_blocks_count(4)
                .output_file("/tmp/out")
                .output_block_size(4096)
                .output_seek_blocks(2)
                .append()
                .describe(),
            "dd if=/dev/sda ibs=512 skip=1 count=4 of=/tmp/out obs=4096 seek=2 conv=notrunc oflag=append"
        );
    }

    #[tokio::test]
    async fn test_copies_selected_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        std::fs::write(&source, "aaaabbbbccccdddd").unwrap();

        let ctx = ExecutionContext::new();
        Dd::new()
            .input_file(&source)
            .input_block_size(4)
            .input_skip_blocks(1)
            .input_blocks_count(2)
            .output_file(&target)
            .run_noout(&ctx)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "bbbbcccc");

        Dd::new()
            .input_file(&source)
            .input_block_size(4)
            .input_blocks_count(1)
            .output_file(&target)
            .append()
            .run_noout(&ctx)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "bbbbccccaaaa");
    }

    #[tokio::test]
    async fn test_filters_input_in_pipeline() {
        let ctx = ExecutionContext::new();
        let out = Dd::new()
            .input_block_size(3)
            .input_blocks_count(1)
            .to_command()
            .input("abcdef")
            .run_str(&ctx)
            .await
            .unwrap();
        assert_eq!(out, "abc");
    }
}
