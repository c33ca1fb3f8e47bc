//! Screen Recorder - record a screen or window to a WebM file.
//!
//! The recorder core (capture, lifecycle, saving) builds without a webview;
//! the Tauri application lives behind the `desktop` feature.

pub mod capture;
pub mod config;
pub mod finalize;
pub mod recorder;
pub mod utils;

#[cfg(feature = "desktop")]
pub mod commands;

#[cfg(feature = "desktop")]
use commands::recording::RecorderState;
#[cfg(feature = "desktop")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the application
#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screen_recorder=debug,screen_recorder_lib=debug,tauri=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Screen Recorder v{}", env!("CARGO_PKG_VERSION"));

    let config = config::RecorderConfig::load_or_default();

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(RecorderState::new(config))
        .invoke_handler(tauri::generate_handler![
            // Source commands
            commands::sources::list_sources,
            commands::sources::select_source,
            commands::sources::set_microphone,
            // Recording commands
            commands::recording::start_recording,
            commands::recording::pause_recording,
            commands::recording::stop_recording,
            commands::recording::get_recording_state,
            commands::recording::get_recording_duration,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
