fn main() {
    // The webview shell is optional; the recorder core needs no build step.
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
