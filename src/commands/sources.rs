//! Source selection commands

use super::notify::{notify, ToastKind};
use super::recording::{report, RecorderState};
use crate::capture::{CaptureSource, DesktopSources};
use crate::utils::error::{AppError, AppResult, ErrorResponse};
use std::sync::atomic::Ordering;
use tauri::{AppHandle, State};

/// List the screens and windows that can be recorded
#[tauri::command]
pub async fn list_sources(
    app: AppHandle,
    state: State<'_, RecorderState>,
) -> Result<Vec<CaptureSource>, ErrorResponse> {
    let provider = DesktopSources::new();
    let mut selector = state.selector.lock().await;

    match selector.refresh(&provider).await {
        Some(sources) => Ok(sources.values().cloned().collect()),
        None => {
            notify(&app, ToastKind::Error, "No video sources found");
            Ok(Vec::new())
        }
    }
}

/// Select the source to record by its label
#[tauri::command]
pub async fn select_source(
    app: AppHandle,
    state: State<'_, RecorderState>,
    label: String,
) -> Result<CaptureSource, ErrorResponse> {
    select(&app, &state, &label)
        .await
        .map_err(|e| report(&app, e))
}

async fn select(app: &AppHandle, state: &RecorderState, label: &str) -> AppResult<CaptureSource> {
    let _busy = state.begin()?;
    if state.current_state().is_active() {
        return Err(AppError::SessionActive);
    }

    let source = state.selector.lock().await.select(label)?.clone();
    state.install(app, source.clone()).await?;
    Ok(source)
}

/// Record the microphone instead of a silent track
#[tauri::command]
pub async fn set_microphone(
    app: AppHandle,
    state: State<'_, RecorderState>,
    enabled: bool,
) -> Result<(), ErrorResponse> {
    toggle_microphone(&app, &state, enabled)
        .await
        .map_err(|e| report(&app, e))
}

async fn toggle_microphone(app: &AppHandle, state: &RecorderState, enabled: bool) -> AppResult<()> {
    let _busy = state.begin()?;
    if state.current_state().is_active() {
        return Err(AppError::SessionActive);
    }

    state.microphone.store(enabled, Ordering::Relaxed);

    let selected = state.selector.lock().await.selected().cloned();
    if let Some(source) = selected {
        state.install(app, source).await?;
    }

    notify(
        app,
        ToastKind::Info,
        if enabled { "Microphone used" } else { "Audio muted" },
    );
    Ok(())
}
