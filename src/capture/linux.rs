//! X11 source enumeration
//!
//! Screens come from `xrandr --listmonitors`, windows from `wmctrl -lG`.
//! Both are captured with FFmpeg's x11grab.

use super::sources::{CaptureError, CaptureSource, GrabInput, SourceKind, SourceProvider};
use async_trait::async_trait;
use tokio::process::Command;

/// A monitor as reported by xrandr
#[derive(Debug, Clone, PartialEq, Eq)]
struct Monitor {
    name: String,
    primary: bool,
    width: u32,
    height: u32,
    x: i32,
    y: i32,
}

/// A top-level window as reported by wmctrl
#[derive(Debug, Clone, PartialEq, Eq)]
struct TopLevelWindow {
    id: String,
    title: String,
}

#[derive(Debug, Clone, Default)]
pub struct X11Sources {
    /// X display, defaults to `$DISPLAY`
    display: Option<String>,
}

impl X11Sources {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn with_display(display: impl Into<String>) -> Self {
        Self {
            display: Some(display.into()),
        }
    }

    fn display(&self) -> Result<String, CaptureError> {
        self.display
            .clone()
            .or_else(|| std::env::var("DISPLAY").ok())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| CaptureError::Enumeration("no X11 display available".to_string()))
    }
}

#[async_trait]
impl SourceProvider for X11Sources {
    async fn sources(&self) -> Result<Vec<CaptureSource>, CaptureError> {
        let display = self.display()?;

        let monitors = match run("xrandr", &["--listmonitors"]).await {
            Some(out) => parse_monitors(&out),
            None => Vec::new(),
        };
        let windows = match run("wmctrl", &["-lG"]).await {
            Some(out) => parse_windows(&out),
            None => Vec::new(),
        };

        Ok(build_sources(&display, &monitors, &windows))
    }
}

/// Run a helper tool, returning its stdout if it succeeded.
async fn run(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output().await {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            tracing::debug!("{} exited with {}", program, output.status);
            None
        }
        Err(e) => {
            tracing::debug!("{} unavailable: {}", program, e);
            None
        }
    }
}

fn build_sources(display: &str, monitors: &[Monitor], windows: &[TopLevelWindow]) -> Vec<CaptureSource> {
    let mut sources = Vec::new();

    if monitors.is_empty() {
        // Without xrandr, x11grab still captures the whole root window.
        sources.push(CaptureSource {
            id: "screen:root".to_string(),
            label: "Entire screen".to_string(),
            kind: SourceKind::Screen,
            grab: GrabInput {
                format: "x11grab".to_string(),
                options: Vec::new(),
                input: display.to_string(),
            },
        });
    }

    for (index, monitor) in monitors.iter().enumerate() {
        let label = if monitor.primary {
            format!("Screen {} ({}, primary)", index + 1, monitor.name)
        } else {
            format!("Screen {} ({})", index + 1, monitor.name)
        };
        sources.push(CaptureSource {
            id: format!("screen:{}", monitor.name),
            label,
            kind: SourceKind::Screen,
            grab: GrabInput {
                format: "x11grab".to_string(),
                options: vec![
                    "-video_size".to_string(),
                    format!("{}x{}", monitor.width, monitor.height),
                ],
                input: format!("{}+{},{}", display, monitor.x, monitor.y),
            },
        });
    }

    for window in windows {
        sources.push(CaptureSource {
            id: format!("window:{}", window.id),
            label: window.title.clone(),
            kind: SourceKind::Window,
            grab: GrabInput {
                format: "x11grab".to_string(),
                options: vec!["-window_id".to_string(), window.id.clone()],
                input: display.to_string(),
            },
        });
    }

    sources
}

/// Parse `xrandr --listmonitors`:
///
/// ```text
/// Monitors: 2
///  0: +*eDP-1 1920/344x1080/194+0+0  eDP-1
///  1: +HDMI-1 2560/597x1440/336+1920+0  HDMI-1
/// ```
fn parse_monitors(output: &str) -> Vec<Monitor> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _index = fields.next()?;
            let flags_and_name = fields.next()?;
            let geometry = fields.next()?;

            let primary = flags_and_name.contains('*');
            let name = flags_and_name.trim_start_matches(['+', '*']).to_string();
            let (width, height, x, y) = parse_geometry(geometry)?;

            Some(Monitor {
                name,
                primary,
                width,
                height,
                x,
                y,
            })
        })
        .collect()
}

/// `1920/344x1080/194+0+0` -> (1920, 1080, 0, 0)
fn parse_geometry(geometry: &str) -> Option<(u32, u32, i32, i32)> {
    let (horizontal, rest) = geometry.split_once('x')?;
    let width = horizontal.split('/').next()?.parse().ok()?;

    let offset_start = rest.find(['+', '-'])?;
    let (vertical, offsets) = rest.split_at(offset_start);
    let height = vertical.split('/').next()?.parse().ok()?;

    let (x, y) = parse_offsets(offsets)?;
    Some((width, height, x, y))
}

/// `+1920+0` / `-1280+0` -> (1920, 0) / (-1280, 0)
fn parse_offsets(offsets: &str) -> Option<(i32, i32)> {
    let second = offsets[1..].find(['+', '-'])? + 1;
    let (x, y) = offsets.split_at(second);
    Some((x.parse().ok()?, y.parse().ok()?))
}

/// Parse `wmctrl -lG`:
///
/// ```text
/// 0x03a00003  0 0    0    1920 1080 host Terminal - bash
/// ```
///
/// Sticky windows (desktop -1: panels, docks) and untitled windows are
/// skipped.
fn parse_windows(output: &str) -> Vec<TopLevelWindow> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let id = fields.next()?;
            let desktop: i32 = fields.next()?.parse().ok()?;
            // x, y, width, height, host
            let mut fields = fields.skip(5);
            let first_word = fields.next()?;

            if desktop < 0 || !id.starts_with("0x") {
                return None;
            }

            // Keep the title's original spacing.
            let title_start = line.find(first_word)?;
            let title = line[title_start..].trim().to_string();

            Some(TopLevelWindow {
                id: id.to_string(),
                title,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const XRANDR: &str = "Monitors: 2\n 0: +*eDP-1 1920/344x1080/194+0+0  eDP-1\n 1: +HDMI-1 2560/597x1440/336+1920+0  HDMI-1\n";

    #[test]
    fn test_parse_monitors() {
        let monitors = parse_monitors(XRANDR);
        assert_eq!(
            monitors,
            vec![
                Monitor {
                    name: "eDP-1".to_string(),
                    primary: true,
                    width: 1920,
                    height: 1080,
                    x: 0,
                    y: 0,
                },
                Monitor {
                    name: "HDMI-1".to_string(),
                    primary: false,
                    width: 2560,
                    height: 1440,
                    x: 1920,
                    y: 0,
                },
            ]
        );
    }

    #[test]
    fn test_parse_geometry_negative_offset() {
        assert_eq!(parse_geometry("1280/300x1024/240-1280+0"), Some((1280, 1024, -1280, 0)));
        assert_eq!(parse_geometry("garbage"), None);
    }

    #[test]
    fn test_parse_windows() {
        let output = "0x01000007 -1 0    0    1920 32   host Top Panel\n\
                      0x03a00003  0 10   40   800  600  host Terminal  -  bash\n\
                      0x04400001  1 0    0    640  480  host\n";
        let windows = parse_windows(output);

        assert_eq!(
            windows,
            vec![TopLevelWindow {
                id: "0x03a00003".to_string(),
                title: "Terminal  -  bash".to_string(),
            }]
        );
    }

    #[test]
    fn test_build_sources() {
        let monitors = parse_monitors(XRANDR);
        let windows = vec![TopLevelWindow {
            id: "0x03a00003".to_string(),
            title: "Terminal".to_string(),
        }];

        let sources = build_sources(":1", &monitors, &windows);

        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].label, "Screen 1 (eDP-1, primary)");
        assert_eq!(sources[1].grab.input, ":1+1920,0");
        assert_eq!(sources[1].grab.options, vec!["-video_size", "2560x1440"]);
        assert_eq!(sources[2].kind, SourceKind::Window);
        assert_eq!(sources[2].grab.options, vec!["-window_id", "0x03a00003"]);
        assert_eq!(sources[2].grab.input, ":1");
    }

    #[test]
    fn test_build_sources_without_monitors() {
        let sources = build_sources(":0", &[], &[]);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, "screen:root");
        assert!(sources[0].grab.options.is_empty());
    }

    #[test]
    fn test_explicit_display_used() {
        let provider = X11Sources::with_display(":42");
        assert_eq!(provider.display().unwrap(), ":42");
    }
}
