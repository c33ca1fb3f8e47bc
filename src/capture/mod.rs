//! Capture sources and the FFmpeg capture sink
//!
//! This module enumerates screens and windows on each platform and records
//! the selected one.

pub mod ffmpeg;
pub mod permissions;
pub mod sources;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

pub use ffmpeg::{FfmpegCaptureOptions, FfmpegSink};
pub use permissions::{has_screen_recording_permission, request_screen_recording_permission};
pub use sources::{
    list_sources, CaptureError, CaptureSource, GrabInput, SourceKind, SourceProvider,
    SourceSelector,
};

/// Source provider of the current platform
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub type DesktopSources = linux::X11Sources;

#[cfg(target_os = "macos")]
pub type DesktopSources = macos::DisplaySources;

#[cfg(target_os = "windows")]
pub type DesktopSources = windows::GdiSources;
