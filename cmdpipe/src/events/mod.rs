//! Run log records and the sinks that receive them.
//!
//! Every stage waiter writes one [`StageRecord`] once its process has
//! exited; every pipeline waiter writes one [`PipelineRecord`] before it
//! starts collecting its stages. Sinks are shared by all stages of a run,
//! so each record must reach the sink as one uninterrupted group.

mod record;
mod sink;

pub use record::{LogEntry, PipelineRecord, StageRecord};
pub use sink::{LogSink, MemoryLogSink, TracingLogSink, WriterLogSink};

#[cfg(test)]
pub use sink::MockLogSink;
