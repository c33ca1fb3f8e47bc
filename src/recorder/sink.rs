//! Capture sink abstraction
//!
//! A capture sink turns a live audio/video source into encoded chunks,
//! delivered over a channel while it runs.

use super::chunks::Chunk;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Where a sink delivers encoded chunks
pub type ChunkSender = mpsc::UnboundedSender<Chunk>;

/// Capture sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Sink is already running")]
    AlreadyRunning,

    #[error("Sink is not running")]
    NotRunning,
}

pub type SinkResult<T> = Result<T, SinkError>;

/// An encoder fed by a capture device
///
/// Chunks must be sent in production order. Once `stop` returns the sink
/// must not send anything more and must have dropped its sender.
#[async_trait]
pub trait CaptureSink: Send {
    /// Identifier used in logs
    fn id(&self) -> &str;

    /// Acquire the device and start encoding, flushing a chunk every
    /// `timeslice`.
    async fn start(&mut self, chunks: ChunkSender, timeslice: Duration) -> SinkResult<()>;

    /// Stop capturing until `resume`. A sink may end its current stream
    /// here; data sent after `resume` then starts a new container segment.
    async fn pause(&mut self) -> SinkResult<()>;

    async fn resume(&mut self) -> SinkResult<()>;

    /// Finish encoding, flush the remaining data and release the device.
    async fn stop(&mut self) -> SinkResult<()>;
}
