//! Error types and handling
//!
//! Application-wide error type and the form errors take when they cross
//! the IPC boundary.

use crate::capture::CaptureError;
use crate::recorder::state::Action;
use crate::recorder::{RecorderError, RecordingState, SinkError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Choose a source first")]
    NoSourceSelected,

    #[error("Start recording first")]
    NotRecording,

    #[error("Cannot change the source while recording")]
    SessionActive,

    #[error("Another recording operation is still in progress")]
    Busy,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Recording error: {0}")]
    Recording(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl From<RecorderError> for AppError {
    fn from(error: RecorderError) -> Self {
        match error {
            RecorderError::InvalidTransition(t) => match (t.from, t.action) {
                (RecordingState::Idle, Action::Pause | Action::Stop) => AppError::NotRecording,
                _ => AppError::InvalidOperation(t.to_string()),
            },
            RecorderError::Capture(SinkError::PermissionDenied(message)) => {
                AppError::PermissionDenied(message)
            }
            RecorderError::Capture(e) => AppError::Recording(e.to_string()),
        }
    }
}

/// Error response for frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Io(_) => "IO_ERROR",
            AppError::NoSourceSelected => "NO_SOURCE_SELECTED",
            AppError::NotRecording => "NOT_RECORDING",
            AppError::SessionActive => "SESSION_ACTIVE",
            AppError::Busy => "BUSY",
            AppError::InvalidOperation(_) => "INVALID_OPERATION",
            AppError::Capture(_) => "CAPTURE_ERROR",
            AppError::Recording(_) => "RECORDING_ERROR",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transitions_become_hints() {
        let stop_idle = RecordingState::Idle.transition(Action::Stop).unwrap_err();
        let response = ErrorResponse::from(AppError::from(RecorderError::from(stop_idle)));
        assert_eq!(response.code, "NOT_RECORDING");
        assert_eq!(response.message, "Start recording first");

        let pause_paused = RecordingState::Paused.transition(Action::Pause).unwrap_err();
        let response = ErrorResponse::from(AppError::from(RecorderError::from(pause_paused)));
        assert_eq!(response.code, "INVALID_OPERATION");
        assert_eq!(response.message, "Invalid operation: cannot pause while paused");
    }

    #[test]
    fn test_capture_errors_keep_permission_kind() {
        let err = RecorderError::Capture(SinkError::PermissionDenied("screen".to_string()));
        assert_eq!(ErrorResponse::from(AppError::from(err)).code, "PERMISSION_DENIED");

        let err = RecorderError::Capture(SinkError::NotRunning);
        let response = ErrorResponse::from(AppError::from(err));
        assert_eq!(response.code, "RECORDING_ERROR");
        assert_eq!(response.message, "Recording error: Sink is not running");
    }
}
