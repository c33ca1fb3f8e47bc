//! Windows source enumeration using GDI
//!
//! Monitors come from EnumDisplayMonitors, windows from EnumWindows. Both
//! are captured with FFmpeg's gdigrab.

use crate::capture::sources::{CaptureError, CaptureSource, GrabInput, SourceKind, SourceProvider};
use async_trait::async_trait;

use windows::{
    Win32::Foundation::{BOOL, HWND, LPARAM, RECT},
    Win32::Graphics::Gdi::{EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW},
    Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowTextLengthW, GetWindowTextW, IsWindowVisible,
    },
};

/// Monitor geometry in virtual-desktop coordinates
#[derive(Debug, Clone)]
struct MonitorRect {
    name: String,
    is_primary: bool,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

fn enumerate_monitors() -> Vec<MonitorRect> {
    use std::mem::zeroed;

    let mut monitors: Vec<MonitorRect> = Vec::new();
    let monitors_ptr = &mut monitors as *mut Vec<MonitorRect>;

    unsafe extern "system" fn enum_monitors_callback(
        hmonitor: HMONITOR,
        _hdc: HDC,
        _rect: *mut RECT,
        lparam: LPARAM,
    ) -> BOOL {
        let monitors = &mut *(lparam.0 as *mut Vec<MonitorRect>);

        let mut monitor_info: MONITORINFOEXW = unsafe { zeroed() };
        monitor_info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

        if unsafe { GetMonitorInfoW(hmonitor, &mut monitor_info.monitorInfo) }.as_bool() {
            let rect = monitor_info.monitorInfo.rcMonitor;
            let is_primary = (monitor_info.monitorInfo.dwFlags & 1) != 0; // MONITORINFOF_PRIMARY

            let name_len = monitor_info
                .szDevice
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(monitor_info.szDevice.len());

            monitors.push(MonitorRect {
                name: String::from_utf16_lossy(&monitor_info.szDevice[..name_len]),
                is_primary,
                x: rect.left,
                y: rect.top,
                width: (rect.right - rect.left) as u32,
                height: (rect.bottom - rect.top) as u32,
            });
        }

        BOOL::from(true)
    }

    unsafe {
        let _ = EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(enum_monitors_callback),
            LPARAM(monitors_ptr as isize),
        );
    }

    monitors
}

fn enumerate_window_titles() -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    let titles_ptr = &mut titles as *mut Vec<String>;

    unsafe extern "system" fn enum_windows_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let titles = &mut *(lparam.0 as *mut Vec<String>);

        if unsafe { IsWindowVisible(hwnd) }.as_bool() {
            let len = unsafe { GetWindowTextLengthW(hwnd) };
            if len > 0 {
                let mut buffer = vec![0u16; len as usize + 1];
                let copied = unsafe { GetWindowTextW(hwnd, &mut buffer) };
                if copied > 0 {
                    titles.push(String::from_utf16_lossy(&buffer[..copied as usize]));
                }
            }
        }

        BOOL::from(true)
    }

    unsafe {
        if let Err(e) = EnumWindows(Some(enum_windows_callback), LPARAM(titles_ptr as isize)) {
            tracing::warn!("EnumWindows failed: {}", e);
        }
    }

    titles
}

/// Screens and top-level windows of the interactive desktop
#[derive(Debug, Clone, Copy, Default)]
pub struct GdiSources;

impl GdiSources {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceProvider for GdiSources {
    async fn sources(&self) -> Result<Vec<CaptureSource>, CaptureError> {
        let (monitors, titles) =
            tokio::task::spawn_blocking(|| (enumerate_monitors(), enumerate_window_titles()))
                .await
                .map_err(|e| CaptureError::Enumeration(e.to_string()))?;

        let mut sources = Vec::with_capacity(monitors.len() + titles.len());

        for (index, monitor) in monitors.iter().enumerate() {
            let label = if monitor.is_primary {
                format!("Screen {} (primary)", index + 1)
            } else {
                format!("Screen {}", index + 1)
            };
            sources.push(CaptureSource {
                id: format!("screen:{}", monitor.name),
                label,
                kind: SourceKind::Screen,
                grab: GrabInput {
                    format: "gdigrab".to_string(),
                    options: vec![
                        "-offset_x".to_string(),
                        monitor.x.to_string(),
                        "-offset_y".to_string(),
                        monitor.y.to_string(),
                        "-video_size".to_string(),
                        format!("{}x{}", monitor.width, monitor.height),
                    ],
                    input: "desktop".to_string(),
                },
            });
        }

        if monitors.is_empty() {
            sources.push(CaptureSource {
                id: "screen:desktop".to_string(),
                label: "Entire screen".to_string(),
                kind: SourceKind::Screen,
                grab: GrabInput {
                    format: "gdigrab".to_string(),
                    options: Vec::new(),
                    input: "desktop".to_string(),
                },
            });
        }

        for title in titles {
            sources.push(CaptureSource {
                id: format!("window:{}", title),
                label: title.clone(),
                kind: SourceKind::Window,
                grab: GrabInput {
                    format: "gdigrab".to_string(),
                    options: Vec::new(),
                    input: format!("title={}", title),
                },
            });
        }

        Ok(sources)
    }
}
