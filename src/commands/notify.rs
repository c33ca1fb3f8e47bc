//! Transient user notifications
//!
//! Emitted as `toast` events; the frontend renders each one briefly.

use serde::Serialize;
use tauri::{AppHandle, Emitter};

pub const TOAST_EVENT: &str = "toast";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

pub fn notify(app: &AppHandle, kind: ToastKind, message: impl Into<String>) {
    let toast = Toast {
        kind,
        message: message.into(),
    };

    if let Err(e) = app.emit(TOAST_EVENT, &toast) {
        tracing::warn!("Failed to emit toast {:?}: {}", toast.message, e);
    }
}
