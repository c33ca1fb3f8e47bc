//! Tauri command handlers
//!
//! IPC commands the frontend calls via Tauri's invoke system, plus the
//! adapters that let the finalizer talk to the desktop (save dialog,
//! opening files) and the toast notifications shown to the user.

pub mod notify;
pub mod recording;
pub mod shell;
pub mod sources;
