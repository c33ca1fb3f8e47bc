//! Desktop adapters for the finalizer
//!
//! The save dialog and the file opener used once a recording is written.

use crate::finalize::{FileOpener, SavePathPrompt};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tauri::AppHandle;
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_shell::ShellExt;
use tokio::sync::oneshot;

/// Native "Save Video" dialog with the default path pre-filled
pub struct DialogPrompt {
    app: AppHandle,
}

impl DialogPrompt {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

#[async_trait]
impl SavePathPrompt for DialogPrompt {
    async fn choose(&self, default_path: &Path) -> Option<PathBuf> {
        let (tx, rx) = oneshot::channel();

        let mut dialog = self
            .app
            .dialog()
            .file()
            .set_title("Save Video")
            .add_filter("WebM video", &["webm"]);
        if let Some(dir) = default_path.parent() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(name) = default_path.file_name() {
            dialog = dialog.set_file_name(name.to_string_lossy());
        }

        dialog.save_file(move |path| {
            let _ = tx.send(path);
        });

        let chosen = rx.await.ok().flatten()?;
        match chosen.into_path() {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Unusable save path from dialog: {}", e);
                None
            }
        }
    }
}

/// Opens saved recordings through the shell plugin
pub struct ShellOpener {
    app: AppHandle,
}

impl ShellOpener {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl FileOpener for ShellOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        #[allow(deprecated)]
        self.app
            .shell()
            .open(path.to_string_lossy().to_string(), None)
            .map_err(|e| io::Error::other(e.to_string()))
    }
}
