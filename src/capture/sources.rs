//! Capture sources
//!
//! Platform-agnostic description of the screens and windows that can be
//! recorded, and the selection the user makes among them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// What a source captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Screen,
    Window,
}

/// How FFmpeg opens a source: `-f <format> <options..> -i <input>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrabInput {
    pub format: String,
    pub options: Vec<String>,
    pub input: String,
}

/// A selectable screen or window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSource {
    /// Stable identifier
    pub id: String,

    /// Human-readable label
    pub label: String,

    pub kind: SourceKind,

    pub grab: GrabInput,
}

/// Source enumeration errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to enumerate sources: {0}")]
    Enumeration(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),
}

/// Lists capture sources
#[async_trait]
pub trait SourceProvider: Send + Sync {
    async fn sources(&self) -> Result<Vec<CaptureSource>, CaptureError>;
}

/// List sources keyed by label.
///
/// Never fails: enumeration errors and an empty result are logged and
/// reported as `None`. Duplicate labels get a ` (2)`, ` (3)`... suffix.
pub async fn list_sources(provider: &dyn SourceProvider) -> Option<BTreeMap<String, CaptureSource>> {
    let sources = match provider.sources().await {
        Ok(sources) => sources,
        Err(e) => {
            tracing::error!("Error retrieving video sources: {}", e);
            return None;
        }
    };

    if sources.is_empty() {
        tracing::warn!("No video sources found");
        return None;
    }

    let mut by_label = BTreeMap::new();
    for mut source in sources {
        let base = source.label.clone();
        let mut n = 2;
        while by_label.contains_key(&source.label) {
            source.label = format!("{} ({})", base, n);
            n += 1;
        }
        by_label.insert(source.label.clone(), source);
    }

    tracing::debug!("Found {} video sources", by_label.len());
    Some(by_label)
}

/// The listed sources and the user's choice among them
#[derive(Debug, Default)]
pub struct SourceSelector {
    sources: BTreeMap<String, CaptureSource>,
    selected: Option<CaptureSource>,
}

impl SourceSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-list sources. The current selection is kept even if the source
    /// disappeared from the listing.
    pub async fn refresh(&mut self, provider: &dyn SourceProvider) -> Option<&BTreeMap<String, CaptureSource>> {
        match list_sources(provider).await {
            Some(sources) => {
                self.sources = sources;
                Some(&self.sources)
            }
            None => {
                self.sources.clear();
                None
            }
        }
    }

    pub fn sources(&self) -> &BTreeMap<String, CaptureSource> {
        &self.sources
    }

    pub fn select(&mut self, label: &str) -> Result<&CaptureSource, CaptureError> {
        let source = self
            .sources
            .get(label)
            .cloned()
            .ok_or_else(|| CaptureError::UnknownSource(label.to_string()))?;
        tracing::info!("Selected source {} ({})", source.label, source.id);
        Ok(self.selected.insert(source))
    }

    pub fn selected(&self) -> Option<&CaptureSource> {
        self.selected.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn source(id: &str, label: &str) -> CaptureSource {
        CaptureSource {
            id: id.to_string(),
            label: label.to_string(),
            kind: SourceKind::Screen,
            grab: GrabInput {
                format: "x11grab".to_string(),
                options: vec!["-video_size".to_string(), "1920x1080".to_string()],
                input: ":0+0,0".to_string(),
            },
        }
    }

    struct Fixed(Result<Vec<CaptureSource>, String>);

    #[async_trait]
    impl SourceProvider for Fixed {
        async fn sources(&self) -> Result<Vec<CaptureSource>, CaptureError> {
            self.0.clone().map_err(CaptureError::Enumeration)
        }
    }

    #[tokio::test]
    async fn test_keyed_by_label_with_duplicates() {
        let provider = Fixed(Ok(vec![
            source("window:1", "Terminal"),
            source("screen:0", "Screen 1"),
            source("window:2", "Terminal"),
            source("window:3", "Terminal"),
        ]));

        let sources = list_sources(&provider).await.unwrap();

        assert_eq!(sources.len(), 4);
        assert_eq!(sources["Terminal"].id, "window:1");
        assert_eq!(sources["Terminal (2)"].id, "window:2");
        assert_eq!(sources["Terminal (3)"].id, "window:3");
        assert_eq!(sources["Screen 1"].label, "Screen 1");
    }

    #[tokio::test]
    async fn test_failure_and_empty_are_none() {
        assert!(list_sources(&Fixed(Err("no display".to_string()))).await.is_none());
        assert!(list_sources(&Fixed(Ok(Vec::new()))).await.is_none());
    }

    #[tokio::test]
    async fn test_selector() {
        let mut selector = SourceSelector::new();
        assert!(selector.select("Screen 1").is_err());

        let provider = Fixed(Ok(vec![source("screen:0", "Screen 1")]));
        assert!(selector.refresh(&provider).await.is_some());

        assert_eq!(selector.select("Screen 1").unwrap().id, "screen:0");
        assert!(matches!(
            selector.select("Screen 9"),
            Err(CaptureError::UnknownSource(_))
        ));
        assert_eq!(selector.selected().unwrap().id, "screen:0");

        // Selection survives a failed refresh
        assert!(selector.refresh(&Fixed(Ok(Vec::new()))).await.is_none());
        assert!(selector.sources().is_empty());
        assert_eq!(selector.selected().unwrap().id, "screen:0");
    }
}
