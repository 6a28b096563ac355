//! Waiter lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a spawned process (or pipeline) as tracked by its waiter.
///
/// Transitions only move forward:
/// `Spawned -> Draining -> Exited -> ValidatedOk | ValidatedFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    /// The process has been created.
    Spawned,
    /// The error stream is being drained; exit not yet observed.
    Draining,
    /// The exit has been observed but not validated.
    Exited,
    /// The waiter produced a successful result.
    ValidatedOk,
    /// The waiter produced an error.
    ValidatedFailed,
}

impl WaitState {
    /// Returns true once the waiter has produced a result.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ValidatedOk | Self::ValidatedFailed)
    }

    const fn as_u8(self) -> u8 {
        match self {
            Self::Spawned => 0,
            Self::Draining => 1,
            Self::Exited => 2,
            Self::ValidatedOk => 3,
            Self::ValidatedFailed => 4,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Spawned,
            1 => Self::Draining,
            2 => Self::Exited,
            3 => Self::ValidatedOk,
            _ => Self::ValidatedFailed,
        }
    }
}

impl fmt::Display for WaitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawned => write!(f, "spawned"),
            Self::Draining => write!(f, "draining"),
            Self::Exited => write!(f, "exited"),
            Self::ValidatedOk => write!(f, "validated_ok"),
            Self::ValidatedFailed => write!(f, "validated_failed"),
        }
    }
}

/// Atomic cell holding a [`WaitState`] that only moves forward.
#[derive(Debug)]
pub(crate) struct AtomicWaitState(AtomicU8);

impl AtomicWaitState {
    pub(crate) const fn new(state: WaitState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    pub(crate) fn load(&self) -> WaitState {
        WaitState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Advances to `next` unless the state is already at or past it.
    pub(crate) fn advance(&self, next: WaitState) {
        self.0.fetch_max(next.as_u8(), Ordering::AcqRel);
    }
}
