//! Windows capture sources
//!
//! Uses GDI for enumeration and FFmpeg's gdigrab for capture.

pub mod screen;

pub use screen::GdiSources;
