//! Core value types shared by the execution machinery.
//!
//! - [`WaitState`], the lifecycle of a spawned unit as seen by its waiter
//! - Conversions from captured output bytes to the caller-facing shapes

pub mod output;
pub(crate) mod status;

pub use status::WaitState;
