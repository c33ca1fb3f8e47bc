//! User settings
//!
//! Stored as JSON in the platform config directory. Every field has a
//! default so partial files are accepted.

use crate::capture::FfmpegCaptureOptions;
use crate::finalize::paths::default_output_dir;
use crate::finalize::FinalizerOptions;
use crate::recorder::RecorderSettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "screen-recorder";
const SETTINGS_FILE: &str = "settings.json";
const MAX_COUNTDOWN_SECS: u32 = 60;
const MIN_CHUNK_INTERVAL_MS: u64 = 10;
const MAX_CHUNK_INTERVAL_MS: u64 = 10_000;
const MAX_FRAME_RATE: u32 = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderConfig {
    /// Countdown start value before a recording begins
    pub countdown_secs: u32,

    /// How often encoded data is flushed from the capture process
    pub chunk_interval_ms: u64,

    /// Default save folder (None = "recorded" under Downloads)
    pub output_dir: Option<PathBuf>,

    /// File name prefix; a creation timestamp is appended
    pub file_name_prefix: String,

    /// FFmpeg executable used for capture and remuxing
    pub ffmpeg_path: String,

    pub frame_rate: u32,

    /// Ideal capture size, used when a source does not report its own
    pub video_width: u32,
    pub video_height: u32,

    /// Microphone device name (required on Windows)
    pub microphone_device: Option<String>,

    /// Open saved files with the system player
    pub open_after_save: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 5,
            chunk_interval_ms: 200,
            output_dir: None,
            file_name_prefix: "recorded-video".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            frame_rate: 30,
            video_width: 1920,
            video_height: 1080,
            microphone_device: None,
            open_after_save: true,
        }
    }
}

impl RecorderConfig {
    /// Default location of the settings file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults on any
    /// problem.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring settings: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.countdown_secs > MAX_COUNTDOWN_SECS {
            bail!("countdownSecs must be at most {}", MAX_COUNTDOWN_SECS);
        }
        if !(MIN_CHUNK_INTERVAL_MS..=MAX_CHUNK_INTERVAL_MS).contains(&self.chunk_interval_ms) {
            bail!(
                "chunkIntervalMs must be between {} and {}",
                MIN_CHUNK_INTERVAL_MS,
                MAX_CHUNK_INTERVAL_MS
            );
        }
        if self.frame_rate == 0 || self.frame_rate > MAX_FRAME_RATE {
            bail!("frameRate must be between 1 and {}", MAX_FRAME_RATE);
        }
        if self.video_width == 0 || self.video_height == 0 {
            bail!("videoWidth and videoHeight must be non-zero");
        }
        if self.file_name_prefix.trim().is_empty()
            || self.file_name_prefix.contains(['/', '\\'])
        {
            bail!("fileNamePrefix must be a non-empty file name");
        }
        if self.ffmpeg_path.trim().is_empty() {
            bail!("ffmpegPath must not be empty");
        }
        Ok(())
    }

    /// Timing parameters for a recorder built from these settings
    pub fn recorder_settings(&self) -> RecorderSettings {
        RecorderSettings {
            countdown_from: self.countdown_secs,
            chunk_interval: Duration::from_millis(self.chunk_interval_ms),
            ..RecorderSettings::default()
        }
    }

    /// FFmpeg capture options; the microphone starts off
    pub fn capture_options(&self) -> FfmpegCaptureOptions {
        FfmpegCaptureOptions {
            ffmpeg: PathBuf::from(&self.ffmpeg_path),
            frame_rate: self.frame_rate,
            max_size: Some((self.video_width, self.video_height)),
            microphone: false,
            microphone_device: self.microphone_device.clone(),
        }
    }

    /// Where and how finished recordings are saved. `None` when no output
    /// folder is configured and the platform has no Downloads or home
    /// folder.
    pub fn finalizer_options(&self) -> Option<FinalizerOptions> {
        let output_dir = self.output_dir.clone().or_else(default_output_dir)?;
        Some(FinalizerOptions {
            output_dir,
            file_name_prefix: self.file_name_prefix.clone(),
            open_after_save: self.open_after_save,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = RecorderConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, RecorderConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "countdownSecs": 3, "openAfterSave": false }"#).unwrap();

        let config = RecorderConfig::load(&path).unwrap();
        assert_eq!(config.countdown_secs, 3);
        assert!(!config.open_after_save);
        assert_eq!(config.chunk_interval_ms, 200);
        assert_eq!(config.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_rejects_out_of_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "chunkIntervalMs": 0 }"#).unwrap();
        assert!(RecorderConfig::load(&path).is_err());

        fs::write(&path, r#"{ "fileNamePrefix": "a/b" }"#).unwrap();
        assert!(RecorderConfig::load(&path).is_err());

        fs::write(&path, "not json").unwrap();
        assert!(RecorderConfig::load(&path).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let config = RecorderConfig {
            countdown_secs: 10,
            microphone_device: Some("Mic (USB)".to_string()),
            ..RecorderConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(RecorderConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_recorder_settings() {
        let config = RecorderConfig {
            countdown_secs: 2,
            chunk_interval_ms: 500,
            ..RecorderConfig::default()
        };
        let settings = config.recorder_settings();
        assert_eq!(settings.countdown_from, 2);
        assert_eq!(settings.chunk_interval, Duration::from_millis(500));
        assert_eq!(settings.countdown_tick, Duration::from_secs(1));
    }

    #[test]
    fn test_finalizer_options_prefer_configured_dir() {
        let config = RecorderConfig {
            output_dir: Some(PathBuf::from("/tmp/videos")),
            open_after_save: false,
            ..RecorderConfig::default()
        };
        let options = config.finalizer_options().unwrap();
        assert_eq!(options.output_dir, PathBuf::from("/tmp/videos"));
        assert_eq!(options.file_name_prefix, "recorded-video");
        assert!(!options.open_after_save);
    }

    #[test]
    fn test_capture_options() {
        let options = RecorderConfig::default().capture_options();
        assert_eq!(options.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(options.max_size, Some((1920, 1080)));
        assert!(!options.microphone);
    }
}
