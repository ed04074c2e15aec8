use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub variant: Variant,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub output_dir: PathBuf,
    #[serde(with = "humantime_serde")]
    pub progress_interval: Duration,
    pub progress_step: u8,
}

/// Which language the session minifies. Both variants share the same controller;
/// only the minifier, file name and banner texts differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Css,
    Js,
}

impl Variant {
    /// Guess the variant from a file extension; `None` for unrecognised extensions.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "js" | "mjs" | "cjs" => Some(Variant::Js),
            "css" => Some(Variant::Css),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variant::Css => "CSS",
            Variant::Js => "JavaScript",
        }
    }

    pub fn download_file_name(self) -> &'static str {
        match self {
            Variant::Css => "minified.css",
            Variant::Js => "minified.js",
        }
    }

    /// Stored as the result text when minification fails.
    pub fn failure_sentinel(self) -> &'static str {
        match self {
            Variant::Css => "Invalid CSS",
            Variant::Js => "Invalid JavaScript",
        }
    }

    pub fn success_message(self) -> String {
        format!("{} minified successfully!", self.label())
    }

    pub fn failure_message(self, reason: &str) -> String {
        format!("Failed to minify {}: {reason}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl Status {
    pub fn is_resolved(self) -> bool {
        matches!(self, Status::Succeeded | Status::Failed)
    }
}

/// The single record a presentation layer observes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub source_text: String,
    pub result_text: Option<String>,
    pub status: Status,
    pub message: Option<String>,
    pub progress: u8,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Snapshot emitted after every mutation.
    Changed(Box<Session>),
}

/// Structured report printed by `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinifyReport {
    pub timestamp_utc: String,
    pub variant: Variant,
    pub status: Status,
    pub original_bytes: u64,
    pub minified_bytes: Option<u64>,
    pub saved_ratio: Option<f64>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn variant_from_extension() {
        assert_eq!(Variant::from_path(Path::new("app.mjs")), Some(Variant::Js));
        assert_eq!(Variant::from_path(Path::new("STYLE.CSS")), Some(Variant::Css));
        assert_eq!(Variant::from_path(Path::new("notes.txt")), None);
        assert_eq!(Variant::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn report_serializes_lowercase_variant() {
        let report = MinifyReport {
            timestamp_utc: "2024-01-01T00:00:00Z".into(),
            variant: Variant::Js,
            status: Status::Succeeded,
            original_bytes: 10,
            minified_bytes: Some(5),
            saved_ratio: Some(0.5),
            code: Some("x()".into()),
            message: None,
        };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["variant"], "js");
        assert_eq!(v["status"], "Succeeded");
    }
}
