//! Screen recording permission
//!
//! Only macOS gates screen capture behind a user permission.

/// Check if screen recording permission is granted
pub fn has_screen_recording_permission() -> bool {
    #[cfg(target_os = "macos")]
    {
        core_graphics::access::ScreenCaptureAccess.preflight()
    }

    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}

/// Request screen recording permission
///
/// Prompts the user if permission was not granted yet. Returns true if
/// permission was already granted; a fresh grant needs an app restart.
pub fn request_screen_recording_permission() -> bool {
    #[cfg(target_os = "macos")]
    {
        core_graphics::access::ScreenCaptureAccess.request()
    }

    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}
