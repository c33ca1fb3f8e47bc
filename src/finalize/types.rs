//! Finalization types
//!
//! The persistence boundary consumed by the recorder and its errors.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Stores a finished recording
#[async_trait]
pub trait RecordingStore: Send + Sync {
    /// Persist `data`, a complete container of `duration` active time.
    ///
    /// Returns `true` only if a playable file was written.
    async fn save(&self, data: Vec<u8>, duration: Duration) -> Result<bool, SaveError>;
}

/// Where a finished recording ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRecording {
    /// Final file path
    pub path: PathBuf,

    /// Whether the duration metadata was stamped
    pub remuxed: bool,

    /// Whether the user picked the path (as opposed to the default)
    pub user_chosen: bool,
}

/// Finalization errors
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Nothing was captured")]
    EmptyRecording,

    #[error("Output directory unavailable: {0}")]
    OutputDir(String),
}

/// Errors from the duration-stamping remux step
#[derive(Error, Debug)]
pub enum RemuxError {
    #[error("Failed to run FFmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("FFmpeg exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}
