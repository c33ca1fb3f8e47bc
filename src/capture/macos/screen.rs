//! macOS display enumeration
//!
//! Displays come from CoreGraphics and are captured with FFmpeg's
//! avfoundation device, which names them "Capture screen N" in the same
//! order. Individual windows cannot be captured this way.

use crate::capture::sources::{CaptureError, CaptureSource, GrabInput, SourceKind, SourceProvider};
use async_trait::async_trait;
use core_graphics::display::CGDisplay;

#[derive(Debug, Clone, Copy, Default)]
pub struct DisplaySources;

impl DisplaySources {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceProvider for DisplaySources {
    async fn sources(&self) -> Result<Vec<CaptureSource>, CaptureError> {
        let display_ids = CGDisplay::active_displays()
            .map_err(|code| CaptureError::Enumeration(format!("CGGetActiveDisplayList failed: {}", code)))?;

        let sources = display_ids
            .iter()
            .enumerate()
            .map(|(index, &id)| {
                let display = CGDisplay::new(id);
                let bounds = display.bounds();
                let label = if display.is_main() {
                    "Main Display".to_string()
                } else {
                    format!("Display {}", index + 1)
                };

                CaptureSource {
                    id: format!("screen:{}", id),
                    label: format!(
                        "{} ({}x{})",
                        label, bounds.size.width as u32, bounds.size.height as u32
                    ),
                    kind: SourceKind::Screen,
                    grab: GrabInput {
                        format: "avfoundation".to_string(),
                        options: vec!["-capture_cursor".to_string(), "1".to_string()],
                        input: format!("Capture screen {}:none", index),
                    },
                }
            })
            .collect();

        Ok(sources)
    }
}
