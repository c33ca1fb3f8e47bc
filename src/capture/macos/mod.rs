//! macOS capture sources

pub mod screen;

pub use screen::DisplaySources;
