//! Live processes and the workers that move their data.
//!
//! - [`StreamRelay`]: copies one stream into another on its own task
//! - [`ProcessHandle`] and [`Waiter`]: the view of a spawned unit
//! - [`CaptureBuffer`]: shared in-memory sink used for output capture

mod capture;
mod handle;
mod relay;
mod spawn;

pub use capture::CaptureBuffer;
pub use handle::{BoxedReader, BoxedWriter, ProcessHandle, Waiter};
pub use relay::{join_relays, StreamRelay, RELAY_BUFFER_SIZE};

pub(crate) use spawn::spawn_stage;
