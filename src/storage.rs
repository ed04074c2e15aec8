//! Output sinks used by the session controller.
//!
//! Both sinks are non-fatal from the controller's point of view: an `Err` becomes a
//! status message and the session stays usable.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Save the minified result under a fixed file name.
pub trait FileSink: Send {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Place the minified result on the system clipboard.
pub trait ClipboardSink: Send {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Writes results into a directory on disk.
pub struct DiskSink {
    dir: PathBuf,
}

impl DiskSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSink for DiskSink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create {}", self.dir.display()))?;
        let path = self.dir.join(file_name);
        write_file(&path, bytes)?;
        // Report absolute paths so the banner is unambiguous.
        Ok(std::fs::canonicalize(&path).unwrap_or(path))
    }
}

/// Clipboard stand-in for headless modes.
pub struct NoClipboard;

impl ClipboardSink for NoClipboard {
    fn write_text(&self, _text: &str) -> Result<()> {
        Err(anyhow::anyhow!("clipboard is not available in this mode"))
    }
}

/// Write `bytes` to `path`, used by both the download action and `--output`.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}

/// Default directory for the TUI log file.
pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("minify-cli")
        .join("minify-cli.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_sink_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiskSink::new(dir.path().join("nested"));
        let path = sink.save("minified.css", b"a{color:red}").unwrap();
        assert!(path.ends_with("minified.css"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a{color:red}");
    }

    #[test]
    fn disk_sink_overwrites_previous_result() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiskSink::new(dir.path());
        sink.save("minified.js", b"first()").unwrap();
        let path = sink.save("minified.js", b"second()").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "second()");
    }

    #[test]
    fn no_clipboard_reports_error() {
        assert!(NoClipboard.write_text("x").is_err());
    }
}
