//! Recording finalization
//!
//! Writes finished recordings to disk and stamps their duration, since the
//! streaming container produced during capture cannot carry it.

pub mod ffmpeg;
pub mod paths;
pub mod pipeline;
pub mod segments;
pub mod types;

pub use ffmpeg::{RemuxInput, Remuxer};
pub use pipeline::{FileFinalizer, FileOpener, FinalizerOptions, SavePathPrompt};
pub use types::{RecordingStore, RemuxError, SaveError, SavedRecording};
