//! Duration stamping via FFmpeg
//!
//! The capture process writes a streaming WebM that does not know its own
//! length. Remuxing it with `-c copy` rewrites the container with the
//! duration set, without touching the encoded payload. Recordings made of
//! several segments are joined with the concat demuxer in the same pass.

use super::types::RemuxError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// What the remux reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemuxInput {
    /// A single WebM file
    File(PathBuf),
    /// A concat demuxer list of WebM segments
    Concat(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Remuxer {
    ffmpeg: PathBuf,
}

impl Remuxer {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Copy `input` to `output`, stamping `duration` into the metadata.
    pub async fn stamp_duration(
        &self,
        input: &RemuxInput,
        output: &Path,
        duration: Duration,
    ) -> Result<(), RemuxError> {
        let args = remux_args(input, output, duration);
        tracing::info!("Remuxing {:?} -> {:?} ({}s)", input, output, format_seconds(duration));

        let result = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(RemuxError::Spawn)?;

        if !result.status.success() {
            return Err(RemuxError::Failed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

impl Default for Remuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// Seconds with millisecond precision, as written into the metadata
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

/// Concat demuxer list naming `segments` in order
pub fn concat_list(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|path| {
            let path = path.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'\n", path)
        })
        .collect()
}

fn remux_args(input: &RemuxInput, output: &Path, duration: Duration) -> Vec<String> {
    let mut args: Vec<String> = ["-y", "-hide_banner", "-loglevel", "error"]
        .into_iter()
        .map(String::from)
        .collect();

    match input {
        RemuxInput::File(path) => {
            args.extend(["-i".to_string(), path.to_string_lossy().to_string()]);
        }
        RemuxInput::Concat(list) => {
            args.extend(["-f", "concat", "-safe", "0"].map(String::from));
            args.extend(["-i".to_string(), list.to_string_lossy().to_string()]);
        }
    }

    args.extend([
        "-c".to_string(),
        "copy".to_string(),
        "-metadata".to_string(),
        format!("duration={}", format_seconds(duration)),
        output.to_string_lossy().to_string(),
    ]);
    args
}
