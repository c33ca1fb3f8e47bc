//! Recording-related Tauri commands

use super::notify::{notify, ToastKind};
use super::shell::{DialogPrompt, ShellOpener};
use crate::capture::{
    has_screen_recording_permission, request_screen_recording_permission, CaptureSource,
    FfmpegSink, SourceSelector,
};
use crate::config::RecorderConfig;
use crate::finalize::{FileFinalizer, Remuxer};
use crate::recorder::{ElapsedHandle, Recorder, RecorderEvent, RecordingState};
use crate::utils::error::{AppError, AppResult, ErrorResponse};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tauri::{AppHandle, Emitter, State};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;

pub const RECORDER_EVENT: &str = "recorder-event";

/// Application state for recording
pub struct RecorderState {
    /// Recorder for the selected source; rebuilt on every selection
    pub(crate) recorder: Arc<Mutex<Option<Recorder>>>,
    pub(crate) selector: Mutex<SourceSelector>,
    pub(crate) microphone: AtomicBool,
    pub(crate) config: RecorderConfig,
    /// Current recorder, readable while an operation holds `recorder`
    observed: parking_lot::RwLock<Option<Observed>>,
    busy: AtomicBool,
}

struct Observed {
    state: Arc<parking_lot::RwLock<RecordingState>>,
    elapsed: ElapsedHandle,
}

impl RecorderState {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            recorder: Arc::new(Mutex::new(None)),
            selector: Mutex::new(SourceSelector::new()),
            microphone: AtomicBool::new(false),
            config,
            observed: parking_lot::RwLock::new(None),
            busy: AtomicBool::new(false),
        }
    }

    /// Claim the single outstanding operation slot.
    pub(crate) fn begin(&self) -> AppResult<BusyGuard<'_>> {
        BusyGuard::acquire(&self.busy)
    }

    pub(crate) fn current_state(&self) -> RecordingState {
        self.observed
            .read()
            .as_ref()
            .map(|observed| *observed.state.read())
            .unwrap_or_default()
    }

    pub(crate) fn current_elapsed(&self) -> Duration {
        self.observed
            .read()
            .as_ref()
            .map(|observed| observed.elapsed.elapsed())
            .unwrap_or_default()
    }

    fn observe(&self, recorder: &Recorder) {
        *self.observed.write() = Some(Observed {
            state: recorder.state_handle(),
            elapsed: recorder.elapsed_handle(),
        });
    }

    /// Replace the recorder with a fresh one for `source`.
    pub(crate) async fn install(&self, app: &AppHandle, source: CaptureSource) -> AppResult<()> {
        let recorder = build_recorder(
            app,
            &self.config,
            source,
            self.microphone.load(Ordering::Relaxed),
        )?;

        forward_events(app.clone(), recorder.subscribe());
        let mut slot = self.recorder.lock().await;
        self.observe(&recorder);
        *slot = Some(recorder);
        Ok(())
    }
}

impl Default for RecorderState {
    fn default() -> Self {
        Self::new(RecorderConfig::load_or_default())
    }
}

/// Held while a command runs; overlapping commands are rejected
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> AppResult<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(AppError::Busy);
        }
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn build_recorder(
    app: &AppHandle,
    config: &RecorderConfig,
    source: CaptureSource,
    microphone: bool,
) -> AppResult<Recorder> {
    let mut capture = config.capture_options();
    capture.microphone = microphone;

    let finalizer_options = config.finalizer_options().ok_or_else(|| {
        AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "No folder available to save recordings in",
        ))
    })?;
    let store = FileFinalizer::new(
        finalizer_options,
        Remuxer::new(&config.ffmpeg_path),
        Arc::new(DialogPrompt::new(app.clone())),
        Arc::new(ShellOpener::new(app.clone())),
    );

    tracing::info!(
        "Recorder ready for {} (microphone {})",
        source.label,
        if microphone { "on" } else { "off" }
    );

    Ok(Recorder::new(
        Box::new(FfmpegSink::new(source, capture)),
        Arc::new(store),
        config.recorder_settings(),
    ))
}

/// Mirror recorder events to the frontend until the recorder is dropped.
fn forward_events(app: AppHandle, mut events: broadcast::Receiver<RecorderEvent>) {
    tauri::async_runtime::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = app.emit(RECORDER_EVENT, &event) {
                        tracing::warn!("Failed to emit recorder event: {}", e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} recorder events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Log a failed command and show it to the user.
pub(crate) fn report(app: &AppHandle, error: AppError) -> ErrorResponse {
    tracing::warn!("Command failed: {}", error);
    notify(app, ToastKind::Error, error.to_string());
    error.into()
}

/// Start recording (after the countdown unless `countdown` is false) or
/// resume a paused one
#[tauri::command]
pub async fn start_recording(
    app: AppHandle,
    state: State<'_, RecorderState>,
    countdown: Option<bool>,
) -> Result<RecordingState, ErrorResponse> {
    start(&state, countdown.unwrap_or(true))
        .await
        .map_err(|e| report(&app, e))
}

async fn start(state: &RecorderState, with_countdown: bool) -> AppResult<RecordingState> {
    let _busy = state.begin()?;
    let mut slot = state.recorder.lock().await;
    let recorder = slot.as_mut().ok_or(AppError::NoSourceSelected)?;

    if recorder.state() == RecordingState::Idle && !has_screen_recording_permission() {
        request_screen_recording_permission();
        return Err(AppError::PermissionDenied(
            "Allow screen recording in System Settings and try again".to_string(),
        ));
    }

    Ok(recorder.play(with_countdown).await?)
}

/// Pause recording
#[tauri::command]
pub async fn pause_recording(
    app: AppHandle,
    state: State<'_, RecorderState>,
) -> Result<RecordingState, ErrorResponse> {
    pause(&state).await.map_err(|e| report(&app, e))
}

async fn pause(state: &RecorderState) -> AppResult<RecordingState> {
    let _busy = state.begin()?;
    let mut slot = state.recorder.lock().await;
    let recorder = slot.as_mut().ok_or(AppError::NotRecording)?;
    Ok(recorder.pause().await?)
}

/// Stop recording and save it. Returns whether the video was saved.
#[tauri::command]
pub async fn stop_recording(
    app: AppHandle,
    state: State<'_, RecorderState>,
) -> Result<bool, ErrorResponse> {
    stop(&app, &state).await.map_err(|e| report(&app, e))
}

async fn stop(app: &AppHandle, state: &RecorderState) -> AppResult<bool> {
    let _busy = state.begin()?;
    let mut slot = state.recorder.lock().await;
    let recorder = slot.as_mut().ok_or(AppError::NotRecording)?;

    let saved = recorder.stop().await?;
    if saved {
        notify(app, ToastKind::Success, "Video saved");
    } else {
        notify(app, ToastKind::Error, "Failed to save video");
    }
    Ok(saved)
}

/// Get current recording state
#[tauri::command]
pub fn get_recording_state(state: State<'_, RecorderState>) -> RecordingState {
    state.current_state()
}

/// Get elapsed recording time in seconds
#[tauri::command]
pub fn get_recording_duration(state: State<'_, RecorderState>) -> f64 {
    state.current_elapsed().as_secs_f64()
}
