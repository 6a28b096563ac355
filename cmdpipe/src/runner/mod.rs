//! Caller-facing run operations.
//!
//! Every [`Runnable`] gets the [`RunExt`] operations. Each one spawns the
//! unit, feeds it its configured input, drains its output into a discard
//! sink, memory, a file or a caller-supplied stream, and then consults the
//! waiter. See [`execute`] for the ordering guarantees.
//!
//! ```rust,ignore
//! use cmdpipe::prelude::*;
//!
//! let ctx = ExecutionContext::new();
//! let kernel = Command::new("uname").arg("-r").run_str(&ctx).await?;
//! let lines = Command::new("cat").input("a\nb\n").run_lines(&ctx).await?;
//! ```

mod engine;

pub use engine::execute;

use crate::context::ExecutionContext;
use crate::core::output;
use crate::errors::{CommandError, Result};
use crate::process::CaptureBuffer;
use crate::stages::Runnable;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWrite;

/// Terminal operations available on every runnable unit.
///
/// Any failure aborts the operation: no partial buffer is returned. A
/// destination file may hold a partial write up to the point of failure.
#[async_trait]
pub trait RunExt: Runnable {
    /// Runs the unit, discarding its output, and returns the exit code.
    async fn run_noout(&self, ctx: &ExecutionContext) -> Result<i32> {
        execute(self, ctx, tokio::io::sink()).await
    }

    /// Runs the unit and returns its raw output.
    async fn run_raw(&self, ctx: &ExecutionContext) -> Result<Vec<u8>> {
        let buffer = CaptureBuffer::new();
        execute(self, ctx, buffer.clone()).await?;
        Ok(buffer.take())
    }

    /// Runs the unit and returns its output as text.
    async fn run_rawstr(&self, ctx: &ExecutionContext) -> Result<String> {
        Ok(output::to_text(&self.run_raw(ctx).await?))
    }

    /// Runs the unit and returns its output as text without surrounding
    /// whitespace.
    async fn run_str(&self, ctx: &ExecutionContext) -> Result<String> {
        Ok(output::to_trimmed(&self.run_raw(ctx).await?))
    }

    /// Runs the unit and returns its output lines.
    async fn run_lines(&self, ctx: &ExecutionContext) -> Result<Vec<String>> {
        Ok(output::to_lines(&self.run_raw(ctx).await?))
    }

    /// Runs the unit and returns its NUL-separated output fields.
    async fn run_nul_separated(&self, ctx: &ExecutionContext) -> Result<Vec<String>> {
        Ok(output::to_nul_separated(&self.run_raw(ctx).await?))
    }

    /// Runs the unit and parses its trimmed output as an integer.
    async fn run_long(&self, ctx: &ExecutionContext) -> Result<i64> {
        output::to_long(&self.run_raw(ctx).await?)
    }

    /// Runs the unit, replacing the contents of `path` with its output.
    async fn run_write_to<P>(&self, ctx: &ExecutionContext, path: P) -> Result<i32>
    where
        P: AsRef<Path> + Send,
    {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(|e| CommandError::output_file(path, e))?;
        execute(self, ctx, file).await
    }

    /// Runs the unit, appending its output to `path`.
    async fn run_append_to<P>(&self, ctx: &ExecutionContext, path: P) -> Result<i32>
    where
        P: AsRef<Path> + Send,
    {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .await
            .map_err(|e| CommandError::output_file(path, e))?;
        execute(self, ctx, file).await
    }

    /// Runs the unit, relaying its output into `sink`. The sink is shut
    /// down once the output ends.
    async fn run_into<W>(&self, ctx: &ExecutionContext, sink: W) -> Result<i32>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        execute(self, ctx, sink).await
    }
}

impl<T: Runnable + ?Sized> RunExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Command;
    use pretty_assertions::assert_eq;

    fn sh(script: &str) -> Command {
        Command::new("sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_run_noout_returns_status() {
        let ctx = ExecutionContext::new();
        assert_eq!(sh("echo ignored").run_noout(&ctx).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_str_trims() {
        let ctx = ExecutionContext::new();
        let text = sh("printf '  padded value \\n\\n'").run_str(&ctx).await.unwrap();
        assert_eq!(text, "padded value");
    }

    #[tokio::test]
    async fn test_run_rawstr_keeps_whitespace() {
        let ctx = ExecutionContext::new();
        let text = sh("printf ' a \\n'").run_rawstr(&ctx).await.unwrap();
        assert_eq!(text, " a \n");
    }

    #[tokio::test]
    async fn test_input_round_trip_lines() {
        let ctx = ExecutionContext::new();
        let lines = Command::new("cat")
            .input("hello\nworld")
            .run_lines(&ctx)
            .await
            .unwrap();
        assert_eq!(lines, vec!["hello".to_string(), "world".to_string()]);
    }

    #[tokio::test]
    async fn test_input_is_replayed_on_every_run() {
        let ctx = ExecutionContext::new();
        let cat = Command::new("cat").input("again");
        assert_eq!(cat.run_str(&ctx).await.unwrap(), "again");
        assert_eq!(cat.run_str(&ctx).await.unwrap(), "again");
    }

    #[tokio::test]
    async fn test_stdin_closed_without_input() {
        let ctx = ExecutionContext::new();
        let out = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            Command::new("cat").run_raw(&ctx),
        )
        .await
        .expect("cat kept waiting for input")
        .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_run_lines_empty_output() {
        let ctx = ExecutionContext::new();
        assert!(Command::new("true").run_lines(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_nul_separated() {
        let ctx = ExecutionContext::new();
        let fields = sh("printf 'a\\0\\0b\\0'").run_nul_separated(&ctx).await.unwrap();
        assert_eq!(fields, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_run_long() {
        let ctx = ExecutionContext::new();
        assert_eq!(sh("echo ' 42 '").run_long(&ctx).await.unwrap(), 42);

        let err = sh("echo forty-two").run_long(&ctx).await.unwrap_err();
        assert!(matches!(err, CommandError::Parse { ref text, .. } if text == "forty-two"));
    }

    #[tokio::test]
    async fn test_failed_run_returns_no_output() {
        let ctx = ExecutionContext::new();
        let err = sh("echo partial; exit 2").run_raw(&ctx).await.unwrap_err();
        assert_eq!(err.status(), Some(2));
    }

    #[tokio::test]
    async fn test_run_write_to_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "previous contents").unwrap();

        let ctx = ExecutionContext::new();
        sh("printf new").run_write_to(&ctx, &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_run_append_to_preserves_prior_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "first,").unwrap();

        let ctx = ExecutionContext::new();
        sh("printf second").run_append_to(&ctx, &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first,second");
    }

    #[tokio::test]
    async fn test_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");

        let ctx = ExecutionContext::new();
        let err = Command::new("true").run_write_to(&ctx, &path).await.unwrap_err();
        assert!(matches!(err, CommandError::OutputFile { .. }));
    }

    #[tokio::test]
    async fn test_run_into_caller_sink() {
        let ctx = ExecutionContext::new();
        let sink = CaptureBuffer::new();
        let status = sh("printf streamed").run_into(&ctx, sink.clone()).await.unwrap();
        assert_eq!(status, 0);
        assert_eq!(sink.contents(), b"streamed");
    }

    fn is_running(pid: u32) -> bool {
        // A killed process may linger as a zombie until it is reaped.
        std::fs::read_to_string(format!("/proc/{pid}/stat")).is_ok_and(|stat| {
            stat.rsplit_once(')')
                .and_then(|(_, rest)| rest.trim_start().chars().next())
                .is_some_and(|state| state != 'Z')
        })
    }

    #[tokio::test]
    async fn test_dropped_run_kills_process() {
        let ctx = ExecutionContext::new();
        let unit = sh("echo $$; exec sleep 30");
        let captured = CaptureBuffer::new();

        let run = unit.run_into(&ctx, captured.clone());
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(300), run).await;
        assert!(timed_out.is_err());

        let pid: u32 = output::to_trimmed(&captured.contents()).parse().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert!(!is_running(pid), "process {pid} outlived its run");
    }

    #[tokio::test]
    async fn test_boxed_unit_runs() {
        let ctx = ExecutionContext::new();
        let unit: Box<dyn Runnable> = Box::new(sh("echo boxed"));
        assert_eq!(unit.run_str(&ctx).await.unwrap(), "boxed");
    }
}
