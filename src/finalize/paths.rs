//! Output path naming
//!
//! Recordings are saved as WebM. The bytes are first written next to the
//! target under a `temp ` prefixed name, then remuxed into the target.

use std::path::{Path, PathBuf};

pub const RECORDING_EXTENSION: &str = "webm";
pub const DEFAULT_SUBFOLDER: &str = "recorded";
const TEMP_PREFIX: &str = "temp ";

/// Default save folder: `recorded` under the user's Downloads, falling
/// back to the home directory.
pub fn default_output_dir() -> Option<PathBuf> {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join(DEFAULT_SUBFOLDER))
}

/// `<prefix>-<unix millis>.webm`
pub fn timestamped_file_name(prefix: &str, created_at_ms: i64) -> String {
    format!("{}-{}.{}", prefix, created_at_ms, RECORDING_EXTENSION)
}

/// Make sure `path` ends in `.webm`, appending the extension otherwise.
pub fn with_recording_extension(path: &Path) -> PathBuf {
    let is_webm = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(RECORDING_EXTENSION))
        .unwrap_or(false);

    if is_webm {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(RECORDING_EXTENSION);
        PathBuf::from(name)
    }
}

/// Sibling of `target` the raw bytes are written to before remuxing
pub fn temporary_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{}{}", TEMP_PREFIX, name))
}

/// Sibling of `target` holding segment `index` of a paused recording
pub fn temporary_segment_path(target: &Path, index: usize) -> PathBuf {
    target.with_file_name(format!(
        "{}{}.{}.{}",
        TEMP_PREFIX,
        file_stem(target),
        index,
        RECORDING_EXTENSION
    ))
}

/// Sibling of `target` listing the segments to join
pub fn temporary_list_path(target: &Path) -> PathBuf {
    target.with_file_name(format!("{}{}.txt", TEMP_PREFIX, file_stem(target)))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
