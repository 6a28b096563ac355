//! Per-command overrides of the context defaults.

use std::path::{Path, PathBuf};

/// Per-command elevation setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElevationOverride {
    /// Use the context default.
    #[default]
    Inherit,
    /// Always elevate.
    Enabled,
    /// Never elevate.
    Disabled,
}

impl ElevationOverride {
    /// Resolves against the context default.
    #[must_use]
    pub fn resolve(self, default: bool) -> bool {
        match self {
            Self::Inherit => default,
            Self::Enabled => true,
            Self::Disabled => false,
        }
    }
}

/// Per-command directory setting (chroot or working directory).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PathOverride {
    /// Use the context default.
    #[default]
    Inherit,
    /// Use this directory.
    Set(PathBuf),
    /// Use no directory, whatever the context says.
    Disabled,
}

impl PathOverride {
    /// Resolves against the context default.
    #[must_use]
    pub fn resolve(&self, default: Option<&Path>) -> Option<PathBuf> {
        match self {
            Self::Inherit => default.map(Path::to_path_buf),
            Self::Set(dir) => Some(dir.clone()),
            Self::Disabled => None,
        }
    }
}

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Final argument vector including elevation and chroot prefixes.
    pub argv: Vec<String>,
    /// Working directory; `None` inherits the caller's.
    pub working_dir: Option<PathBuf>,
    /// Whether elevation was requested for the command itself.
    pub elevated: bool,
    /// Chroot directory, if any.
    pub chroot_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_resolution() {
        assert!(ElevationOverride::Inherit.resolve(true));
        assert!(!ElevationOverride::Inherit.resolve(false));
        assert!(ElevationOverride::Enabled.resolve(false));
        assert!(!ElevationOverride::Disabled.resolve(true));
    }

    #[test]
    fn test_path_resolution() {
        let default = Path::new("/ctx");
        assert_eq!(
            PathOverride::Inherit.resolve(Some(default)),
            Some(PathBuf::from("/ctx"))
        );
        assert_eq!(PathOverride::Inherit.resolve(None), None);
        assert_eq!(
            PathOverride::Set("/own".into()).resolve(Some(default)),
            Some(PathBuf::from("/own"))
        );
        assert_eq!(PathOverride::Disabled.resolve(Some(default)), None);
    }
}
