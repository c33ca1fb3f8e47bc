//! FFmpeg capture sink
//!
//! Runs FFmpeg grabbing the selected source plus an audio track (microphone
//! or generated silence), encoding VP9/Opus into a live WebM stream on
//! stdout. The stream is forwarded as chunks on a fixed interval.
//!
//! Every running interval is its own FFmpeg process: pausing finishes the
//! current WebM segment, resuming starts the next one. Nothing is captured
//! while paused, and segments are joined when the recording is saved.

use super::sources::CaptureSource;
use crate::recorder::sink::{CaptureSink, ChunkSender, SinkError, SinkResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Time FFmpeg gets to open the devices and write the stream header
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Time FFmpeg gets to write the stream trailer after `q`
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Silent stereo track used when the microphone is off
const SILENT_AUDIO: &str = "anullsrc=channel_layout=stereo:sample_rate=44100";

#[derive(Debug, Clone)]
pub struct FfmpegCaptureOptions {
    pub ffmpeg: PathBuf,
    pub frame_rate: u32,

    /// Output is scaled down to fit this size, keeping the aspect ratio
    pub max_size: Option<(u32, u32)>,

    pub microphone: bool,

    /// Platform device name; the system default is used when unset
    /// (Windows has no default and requires one)
    pub microphone_device: Option<String>,
}

impl Default for FfmpegCaptureOptions {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            frame_rate: 30,
            max_size: None,
            microphone: false,
            microphone_device: None,
        }
    }
}

/// Capture sink backed by FFmpeg processes
pub struct FfmpegSink {
    id: String,
    source: CaptureSource,
    options: FfmpegCaptureOptions,

    /// Chunk channel of the open session, kept across segments
    chunks: Option<ChunkSender>,
    timeslice: Duration,

    /// Process of the running segment; `None` while paused
    segment: Option<Segment>,
}

/// One FFmpeg process and the task forwarding its output
struct Segment {
    process: Child,
    stdin: Option<ChildStdin>,
    pump: JoinHandle<()>,
}

impl FfmpegSink {
    pub fn new(source: CaptureSource, options: FfmpegCaptureOptions) -> Self {
        Self {
            id: format!("ffmpeg-{}", source.id),
            source,
            options,
            chunks: None,
            timeslice: Duration::ZERO,
            segment: None,
        }
    }

    /// Full FFmpeg argument list for the current source and options
    pub fn args(&self) -> SinkResult<Vec<String>> {
        let grab = &self.source.grab;
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error"]
            .into_iter()
            .map(String::from)
            .collect();

        // Input 0: video
        args.extend([
            "-f".to_string(),
            grab.format.clone(),
            "-framerate".to_string(),
            self.options.frame_rate.to_string(),
        ]);
        args.extend(grab.options.iter().cloned());
        args.extend(["-i".to_string(), grab.input.clone()]);

        // Input 1: audio
        if self.options.microphone {
            args.extend(microphone_input(self.options.microphone_device.as_deref())?);
        } else {
            args.extend(["-f", "lavfi", "-i", SILENT_AUDIO].map(String::from));
        }

        if let Some((width, height)) = self.options.max_size {
            args.extend([
                "-vf".to_string(),
                format!(
                    "scale=w='min({width},iw)':h='min({height},ih)':force_original_aspect_ratio=decrease:force_divisible_by=2"
                ),
            ]);
        }

        args.extend(
            [
                "-map", "0:v", "-map", "1:a",
                "-c:v", "libvpx-vp9", "-deadline", "realtime", "-cpu-used", "8",
                "-row-mt", "1", "-b:v", "4M", "-pix_fmt", "yuv420p",
                "-c:a", "libopus", "-b:a", "128k",
                "-f", "webm", "-live", "1", "-flush_packets", "1", "pipe:1",
            ]
            .map(String::from),
        );

        Ok(args)
    }
}

/// Spawn FFmpeg and wait until it has written the stream header, which
/// means every device is open and capture has begun.
async fn spawn_segment(
    ffmpeg: &Path,
    args: &[String],
    id: &str,
    chunks: ChunkSender,
    timeslice: Duration,
) -> SinkResult<Segment> {
    tracing::debug!("Starting FFmpeg capture: {:?}", args);

    let mut child = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SinkError::Configuration(format!(
                "FFmpeg not found at {}. Please install FFmpeg and add it to PATH.",
                ffmpeg.display()
            )),
            _ => SinkError::Io(e),
        })?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| SinkError::DeviceUnavailable("capture process has no stdout".to_string()))?;

    if let Some(stderr) = child.stderr.take() {
        let id = id.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::warn!("[{}] {}", id, line);
            }
        });
    }

    let mut header = vec![0u8; READ_BUFFER_SIZE];
    let read = match tokio::time::timeout(STARTUP_TIMEOUT, stdout.read(&mut header)).await {
        Ok(read) => read?,
        Err(_) => {
            child.kill().await?;
            return Err(SinkError::DeviceUnavailable(format!(
                "capture process wrote nothing in {:?}",
                STARTUP_TIMEOUT
            )));
        }
    };
    if read == 0 {
        let status = child.wait().await?;
        return Err(SinkError::DeviceUnavailable(format!(
            "capture process exited during startup with {}",
            status
        )));
    }
    header.truncate(read);

    Ok(Segment {
        stdin: child.stdin.take(),
        pump: tokio::spawn(pump_chunks(stdout, header, chunks, timeslice)),
        process: child,
    })
}

/// Let FFmpeg finish the segment cleanly and wait for its output to be
/// forwarded.
async fn finish_segment(segment: Segment) -> SinkResult<()> {
    let Segment {
        mut process,
        stdin,
        pump,
    } = segment;

    // `q` makes FFmpeg write the stream trailer and exit.
    if let Some(mut stdin) = stdin {
        if let Err(e) = stdin.write_all(b"q").await {
            tracing::debug!("Could not signal FFmpeg to quit: {}", e);
        }
    }

    let waited = match tokio::time::timeout(STOP_TIMEOUT, process.wait()).await {
        Ok(Ok(status)) => {
            if !status.success() {
                tracing::warn!("FFmpeg capture exited with {}", status);
            }
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::warn!("Failed to wait for FFmpeg: {}", e);
            Ok(())
        }
        Err(_) => {
            tracing::warn!("FFmpeg did not finish in {:?}; killing it", STOP_TIMEOUT);
            process.kill().await
        }
    };

    if let Err(e) = pump.await {
        tracing::warn!("Capture pump task failed: {}", e);
    }

    waited.map_err(SinkError::from)
}

/// FFmpeg input arguments for the microphone
fn microphone_input(device: Option<&str>) -> SinkResult<Vec<String>> {
    #[cfg(target_os = "macos")]
    let args = vec![
        "-f".to_string(),
        "avfoundation".to_string(),
        "-i".to_string(),
        format!(":{}", device.unwrap_or("default")),
    ];

    #[cfg(target_os = "windows")]
    let args = {
        let device = device.ok_or_else(|| {
            SinkError::Configuration("Set a microphone device name to record audio".to_string())
        })?;
        vec!["-f".to_string(), "dshow".to_string(), "-i".to_string(), format!("audio={}", device)]
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let args = vec![
        "-f".to_string(),
        "pulse".to_string(),
        "-i".to_string(),
        device.unwrap_or("default").to_string(),
    ];

    Ok(args)
}

/// Forward `pending` and everything read from `stream` to `chunks`, one
/// chunk per `interval`. Returns at end of stream after flushing the
/// remainder; the sender is dropped with it.
pub(crate) async fn pump_chunks<R>(
    mut stream: R,
    mut pending: Vec<u8>,
    chunks: ChunkSender,
    interval: Duration,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            read = stream.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => pending.extend_from_slice(&buf[..n]),
                Err(e) => {
                    tracing::warn!("Capture stream read failed: {}", e);
                    break;
                }
            },
            _ = ticker.tick() => {
                if !pending.is_empty() && chunks.send(std::mem::take(&mut pending)).is_err() {
                    tracing::debug!("Chunk receiver gone; stopping capture pump");
                    return;
                }
            }
        }
    }

    if !pending.is_empty() {
        let _ = chunks.send(pending);
    }
}

#[async_trait]
impl CaptureSink for FfmpegSink {
    fn id(&self) -> &str {
        &self.id
    }

    async fn start(&mut self, chunks: ChunkSender, timeslice: Duration) -> SinkResult<()> {
        if self.chunks.is_some() {
            return Err(SinkError::AlreadyRunning);
        }

        self.timeslice = timeslice;
        let args = self.args()?;
        let segment =
            spawn_segment(&self.options.ffmpeg, &args, &self.id, chunks.clone(), timeslice).await?;
        self.segment = Some(segment);
        self.chunks = Some(chunks);

        tracing::info!("FFmpeg capture started for {}", self.source.label);
        Ok(())
    }

    async fn pause(&mut self) -> SinkResult<()> {
        let segment = self.segment.take().ok_or(SinkError::NotRunning)?;
        finish_segment(segment).await?;

        tracing::info!("FFmpeg capture paused for {}", self.source.label);
        Ok(())
    }

    async fn resume(&mut self) -> SinkResult<()> {
        if self.segment.is_some() {
            return Err(SinkError::AlreadyRunning);
        }
        let chunks = self.chunks.clone().ok_or(SinkError::NotRunning)?;

        let args = self.args()?;
        let segment =
            spawn_segment(&self.options.ffmpeg, &args, &self.id, chunks, self.timeslice).await?;
        self.segment = Some(segment);

        tracing::info!("FFmpeg capture resumed for {}", self.source.label);
        Ok(())
    }

    async fn stop(&mut self) -> SinkResult<()> {
        // Session state is cleared before anything can fail.
        self.chunks.take().ok_or(SinkError::NotRunning)?;
        let segment = self.segment.take();

        if let Some(segment) = segment {
            finish_segment(segment).await?;
        }

        tracing::info!("FFmpeg capture stopped for {}", self.source.label);
        Ok(())
    }
}
