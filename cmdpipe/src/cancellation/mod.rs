//! Cooperative cancellation for runs.
//!
//! A [`CancellationToken`] attached to an
//! [`ExecutionContext`](crate::context::ExecutionContext) interrupts every
//! relay and waiter of the runs started with that context.

mod token;

pub use token::{cancelled_or_never, CancellationToken};
