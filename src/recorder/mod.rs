//! Recording system module
//!
//! - CaptureSink trait for the encoder fed by the selected source
//! - Recorder, the lifecycle controller driving one sink
//! - Stopwatch and countdown timing helpers

pub mod chunks;
pub mod controller;
pub mod countdown;
pub mod sink;
pub mod state;
pub mod stopwatch;

pub use chunks::{Chunk, ChunkBuffer};
pub use controller::{Recorder, RecorderError, RecorderResult};
pub use sink::{CaptureSink, ChunkSender, SinkError, SinkResult};
pub use state::{Action, RecorderEvent, RecorderSettings, RecordingState, Transition};
pub use stopwatch::{ElapsedHandle, Stopwatch};
