//! Finalization pipeline
//!
//! Turns the bytes of a finished recording into a playable file:
//! 1. Ask for a target path (default pre-filled)
//! 2. Write the bytes to a temporary sibling, split per segment if paused
//! 3. Remux into the target with the duration stamped
//! 4. Remove every temporary file and open the result

use super::ffmpeg::{concat_list, RemuxInput, Remuxer};
use super::paths::{
    temporary_list_path, temporary_path, temporary_segment_path, timestamped_file_name,
    with_recording_extension,
};
use super::segments::split_segments;
use super::types::{RecordingStore, SaveError, SavedRecording};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Asks the user where to save
#[async_trait]
pub trait SavePathPrompt: Send + Sync {
    /// `None` means the user cancelled.
    async fn choose(&self, default_path: &Path) -> Option<PathBuf>;
}

/// Opens a saved file for the user
pub trait FileOpener: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FinalizerOptions {
    /// Folder of the default path
    pub output_dir: PathBuf,

    pub file_name_prefix: String,

    /// Open the file after saving when the user picked the path
    pub open_after_save: bool,
}

/// Persists recordings to disk
pub struct FileFinalizer {
    options: FinalizerOptions,
    remuxer: Remuxer,
    prompt: Arc<dyn SavePathPrompt>,
    opener: Arc<dyn FileOpener>,
}

impl FileFinalizer {
    pub fn new(
        options: FinalizerOptions,
        remuxer: Remuxer,
        prompt: Arc<dyn SavePathPrompt>,
        opener: Arc<dyn FileOpener>,
    ) -> Self {
        Self {
            options,
            remuxer,
            prompt,
            opener,
        }
    }

    fn default_path(&self) -> PathBuf {
        let created_at = chrono::Utc::now().timestamp_millis();
        self.options
            .output_dir
            .join(timestamped_file_name(&self.options.file_name_prefix, created_at))
    }

    /// Write `data` to disk with `duration` stamped.
    pub async fn finalize(&self, data: Vec<u8>, duration: Duration) -> Result<SavedRecording, SaveError> {
        if data.is_empty() {
            return Err(SaveError::EmptyRecording);
        }

        tokio::fs::create_dir_all(&self.options.output_dir)
            .await
            .map_err(|e| {
                SaveError::OutputDir(format!("{}: {}", self.options.output_dir.display(), e))
            })?;

        let default_path = self.default_path();
        let chosen = self.prompt.choose(&default_path).await;
        let user_chosen = chosen.is_some();
        let target = with_recording_extension(&chosen.unwrap_or(default_path));

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut temporaries = Vec::new();
        let written = self.write_target(&data, &target, duration, &mut temporaries).await;
        for path in &temporaries {
            remove_temporary(path).await;
        }
        let remuxed = written?;

        if user_chosen && self.options.open_after_save {
            if let Err(e) = self.opener.open(&target) {
                tracing::warn!("Failed to open {:?}: {}", target, e);
            }
        }

        Ok(SavedRecording {
            path: target,
            remuxed,
            user_chosen,
        })
    }

    /// Produce `target`, recording every temporary file created on the way.
    async fn write_target(
        &self,
        data: &[u8],
        target: &Path,
        duration: Duration,
        temporaries: &mut Vec<PathBuf>,
    ) -> Result<bool, SaveError> {
        let temp = temporary_path(target);
        temporaries.push(temp.clone());
        tokio::fs::write(&temp, data).await?;
        tracing::debug!("Wrote {} bytes to {:?}", data.len(), temp);

        let segments = split_segments(data);
        let input = if segments.len() > 1 {
            let mut names = Vec::with_capacity(segments.len());
            for (index, segment) in segments.iter().enumerate() {
                let path = temporary_segment_path(target, index);
                temporaries.push(path.clone());
                tokio::fs::write(&path, segment).await?;
                // Concat lists resolve relative names against their own folder
                names.push(PathBuf::from(path.file_name().unwrap_or_default()));
            }
            let list = temporary_list_path(target);
            temporaries.push(list.clone());
            tokio::fs::write(&list, concat_list(&names)).await?;
            tracing::debug!("Joining {} segments via {:?}", names.len(), list);
            RemuxInput::Concat(list)
        } else {
            RemuxInput::File(temp.clone())
        };

        match self.remuxer.stamp_duration(&input, target, duration).await {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::warn!("{}; keeping the recording without duration metadata", e);
                tokio::fs::rename(&temp, target).await?;
                Ok(false)
            }
        }
    }
}

async fn remove_temporary(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to delete temporary file {:?}: {}", path, e),
    }
}

#[async_trait]
impl RecordingStore for FileFinalizer {
    async fn save(&self, data: Vec<u8>, duration: Duration) -> Result<bool, SaveError> {
        match self.finalize(data, duration).await {
            Ok(saved) => {
                tracing::info!("Recording saved to {:?} (remuxed: {})", saved.path, saved.remuxed);
                Ok(true)
            }
            Err(e) => {
                tracing::error!("Failed to save recording: {}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::fs;
    use tempfile::tempdir;

    struct FixedPath(PathBuf);

    /// Never asks; every recording goes to the default path.
    struct UseDefaultPath;

    #[async_trait]
    impl SavePathPrompt for UseDefaultPath {
        async fn choose(&self, _default_path: &Path) -> Option<PathBuf> {
            None
        }
    }

    #[async_trait]
    impl SavePathPrompt for FixedPath {
        async fn choose(&self, _default_path: &Path) -> Option<PathBuf> {
            Some(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<PathBuf>>,
    }

    impl FileOpener for RecordingOpener {
        fn open(&self, path: &Path) -> io::Result<()> {
            self.opened.lock().push(path.to_path_buf());
            Ok(())
        }
    }

    fn finalizer(
        output_dir: &Path,
        prompt: Arc<dyn SavePathPrompt>,
        opener: Arc<RecordingOpener>,
    ) -> FileFinalizer {
        // Missing binary forces the fallback path
        finalizer_with(output_dir, prompt, opener, Remuxer::new("/nonexistent/ffmpeg-binary"))
    }

    fn finalizer_with(
        output_dir: &Path,
        prompt: Arc<dyn SavePathPrompt>,
        opener: Arc<RecordingOpener>,
        remuxer: Remuxer,
    ) -> FileFinalizer {
        FileFinalizer::new(
            FinalizerOptions {
                output_dir: output_dir.to_path_buf(),
                file_name_prefix: "recorded-video".to_string(),
                open_after_save: true,
            },
            remuxer,
            prompt,
            opener,
        )
    }

    #[tokio::test]
    async fn test_user_path_gets_extension_and_opens() {
        let dir = tempdir().unwrap();
        let opener = Arc::new(RecordingOpener::default());
        let chosen = dir.path().join("picked").join("my clip");
        let finalizer = finalizer(
            &dir.path().join("recorded"),
            Arc::new(FixedPath(chosen.clone())),
            opener.clone(),
        );

        let saved = finalizer
            .finalize(b"webm-bytes".to_vec(), Duration::from_secs(3))
            .await
            .unwrap();

        let expected = dir.path().join("picked").join("my clip.webm");
        assert_eq!(saved.path, expected);
        assert!(saved.user_chosen);
        assert!(!saved.remuxed);
        assert_eq!(fs::read(&expected).unwrap(), b"webm-bytes");
        assert!(!temporary_path(&expected).exists());
        assert_eq!(*opener.opened.lock(), vec![expected]);
    }

    #[tokio::test]
    async fn test_cancelled_prompt_uses_default_without_opening() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("recorded");
        let opener = Arc::new(RecordingOpener::default());
        let finalizer = finalizer(&output_dir, Arc::new(UseDefaultPath), opener.clone());

        assert!(finalizer.save(b"data".to_vec(), Duration::from_secs(1)).await.unwrap());

        let files: Vec<_> = fs::read_dir(&output_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("recorded-video-"));
        assert!(files[0].ends_with(".webm"));
        assert!(opener.opened.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_recording_not_saved() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("recorded");
        let finalizer = finalizer(
            &output_dir,
            Arc::new(UseDefaultPath),
            Arc::new(RecordingOpener::default()),
        );

        assert!(matches!(
            finalizer.finalize(Vec::new(), Duration::from_secs(1)).await,
            Err(SaveError::EmptyRecording)
        ));
        assert!(!finalizer.save(Vec::new(), Duration::from_secs(1)).await.unwrap());
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_unwritable_output_dir_reports_false() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let finalizer = finalizer(
            &blocker.join("recorded"),
            Arc::new(UseDefaultPath),
            Arc::new(RecordingOpener::default()),
        );

        assert!(!finalizer.save(b"data".to_vec(), Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_fallback_still_removes_temp_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("taken.webm");
        fs::create_dir(&target).unwrap();
        let finalizer = finalizer(
            &dir.path().join("recorded"),
            Arc::new(FixedPath(target.clone())),
            Arc::new(RecordingOpener::default()),
        );

        assert!(!finalizer.save(b"data".to_vec(), Duration::from_secs(1)).await.unwrap());
        assert!(target.is_dir());
        assert!(!temporary_path(&target).exists());
    }

    fn webm_segment(payload: &[u8]) -> Vec<u8> {
        let mut data = vec![0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x82, 0x84];
        data.extend_from_slice(b"webm");
        data.extend_from_slice(payload);
        data
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_segmented_fallback_keeps_all_bytes() {
        let dir = tempdir().unwrap();
        let picked = dir.path().join("picked");
        let data = [webm_segment(b"one"), webm_segment(b"two")].concat();
        let finalizer = finalizer(
            &dir.path().join("recorded"),
            Arc::new(FixedPath(picked.join("clip.webm"))),
            Arc::new(RecordingOpener::default()),
        );

        let saved = finalizer.finalize(data.clone(), Duration::from_secs(2)).await.unwrap();

        assert!(!saved.remuxed);
        assert_eq!(fs::read(&saved.path).unwrap(), data);
        assert_eq!(dir_entries(&picked), vec!["clip.webm"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_segments_joined_through_concat_list() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        // Copies the concat list (argument 10) to the output (last argument)
        let ffmpeg = dir.path().join("ffmpeg");
        fs::write(&ffmpeg, "#!/bin/sh\neval out=\\${$#}\ncp \"${10}\" \"$out\"\n").unwrap();
        fs::set_permissions(&ffmpeg, fs::Permissions::from_mode(0o755)).unwrap();

        let picked = dir.path().join("picked");
        let data = [webm_segment(b"one"), webm_segment(b"two")].concat();
        let finalizer = finalizer_with(
            &dir.path().join("recorded"),
            Arc::new(FixedPath(picked.join("clip.webm"))),
            Arc::new(RecordingOpener::default()),
            Remuxer::new(&ffmpeg),
        );

        let saved = finalizer.finalize(data, Duration::from_secs(2)).await.unwrap();

        assert!(saved.remuxed);
        assert_eq!(
            fs::read_to_string(&saved.path).unwrap(),
            "file 'temp clip.0.webm'\nfile 'temp clip.1.webm'\n"
        );
        assert_eq!(dir_entries(&picked), vec!["clip.webm"]);
    }
}
