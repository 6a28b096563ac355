//! Serializable configuration for an [`ExecutionContext`].

use super::execution::{DEFAULT_CHROOT_COMMAND, DEFAULT_ELEVATION_COMMAND};
use super::ExecutionContext;
use crate::errors::{CommandError, Result};
use crate::events::WriterLogSink;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration used to build an [`ExecutionContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Whether exit status validation is suppressed.
    #[serde(default)]
    pub ignore_error_status: bool,
    /// Whether commands are elevated by default.
    #[serde(default)]
    pub elevate: bool,
    /// Default chroot directory.
    #[serde(default)]
    pub chroot_dir: Option<PathBuf>,
    /// Default working directory.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Argument prefix used for elevation.
    #[serde(default = "default_elevation_command")]
    pub elevation_command: Vec<String>,
    /// Program used to enter a chroot.
    #[serde(default = "default_chroot_command")]
    pub chroot_command: String,
    /// File the run log is appended to.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_elevation_command() -> Vec<String> {
    vec![DEFAULT_ELEVATION_COMMAND.to_string()]
}

fn default_chroot_command() -> String {
    DEFAULT_CHROOT_COMMAND.to_string()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            ignore_error_status: false,
            elevate: false,
            chroot_dir: None,
            working_dir: None,
            elevation_command: default_elevation_command(),
            chroot_command: default_chroot_command(),
            log_file: None,
        }
    }
}

impl ContextConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CommandError::config(e.to_string()))
    }

    /// Sets the log file.
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }
}

impl ExecutionContext {
    /// Builds a context from configuration.
    ///
    /// The log file, if configured, is opened for appending.
    pub fn from_config(config: &ContextConfig) -> Result<Self> {
        if config.elevation_command.is_empty() {
            return Err(CommandError::config("elevation_command must not be empty"));
        }

        let mut ctx = Self::new()
            .with_elevation_command(config.elevation_command.iter().cloned())
            .with_chroot_command(config.chroot_command.clone());

        if config.ignore_error_status {
            ctx.begin_ignore_error_status();
        }
        if config.elevate {
            ctx.begin_sudo();
        }
        if let Some(dir) = &config.chroot_dir {
            ctx.begin_chroot(dir);
        }
        if let Some(dir) = &config.working_dir {
            ctx.begin_working_dir(dir);
        }
        if let Some(path) = &config.log_file {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CommandError::config(format!("{}: {e}", path.display())))?;
            ctx.set_log_sink(Some(Arc::new(WriterLogSink::new(file))));
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = ContextConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ContextConfig::default());
        assert_eq!(config.elevation_command, vec!["sudo".to_string()]);
    }

    #[test]
    fn test_parse_full_config() {
        let config = ContextConfig::from_json_str(
            r#"{
                "ignore_error_status": true,
                "elevate": true,
                "chroot_dir": "/mnt/sysroot",
                "working_dir": "/var/tmp",
                "elevation_command": ["doas"],
                "chroot_command": "/usr/sbin/chroot"
            }"#,
        )
        .unwrap();

        let ctx = ExecutionContext::from_config(&config).unwrap();
        assert!(ctx.is_ignore_error_status());
        assert!(ctx.is_sudo());
        assert_eq!(ctx.chroot_dir(), Some(Path::new("/mnt/sysroot")));
        assert_eq!(ctx.working_dir(), Some(Path::new("/var/tmp")));
        assert_eq!(ctx.elevation_command(), ["doas".to_string()]);
        assert_eq!(ctx.chroot_command(), "/usr/sbin/chroot");
        assert!(ctx.log_sink().is_none());
    }

    #[test]
    fn test_invalid_json() {
        let err = ContextConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, CommandError::Config { .. }));
    }

    #[test]
    fn test_empty_elevation_command_rejected() {
        let config = ContextConfig {
            elevation_command: Vec::new(),
            ..ContextConfig::default()
        };
        assert!(ExecutionContext::from_config(&config).is_err());
    }

    #[test]
    fn test_log_file_opened_for_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        std::fs::write(&path, "previous\n").unwrap();

        let config = ContextConfig::new().with_log_file(&path);
        let ctx = ExecutionContext::from_config(&config).unwrap();
        assert!(ctx.log_sink().is_some());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous\n");
    }
}
