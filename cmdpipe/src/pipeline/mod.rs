//! Chaining commands into pipelines.
//!
//! This module provides:
//! - [`Pipeline`], an ordered, non-empty list of runnable stages
//! - The orchestration that wires stage outputs to stage inputs through
//!   relays and folds every stage result into one verdict

mod chain;
mod collect;

pub use chain::Pipeline;
