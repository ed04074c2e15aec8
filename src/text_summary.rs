//! Text summary builder for CLI output.
//!
//! This module formats the human-readable lines printed to stderr in text mode.

use crate::metrics::{self, SizeSummary};
use crate::model::{Session, Status, Variant};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a resolved session.
pub(crate) fn build_text_summary(variant: Variant, session: &Session) -> TextSummary {
    let mut lines = Vec::new();

    if let Some(message) = session.message.as_deref() {
        lines.push(message.to_string());
    }

    if session.status == Status::Succeeded {
        if let Some(result) = session.result_text.as_deref() {
            let size = metrics::compute_size_summary(&session.source_text, result);
            lines.push(format_size_line(variant, &size));
        }
    }

    TextSummary { lines }
}

pub(crate) fn format_size_line(variant: Variant, size: &SizeSummary) -> String {
    format!(
        "{}: {} -> {} (saved {}, {:.1}%)",
        variant.label(),
        metrics::format_bytes(size.original_bytes),
        metrics::format_bytes(size.minified_bytes),
        metrics::format_bytes(size.saved_bytes),
        size.saved_ratio * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeded_session_reports_sizes() {
        let session = Session {
            source_text: "a{color:red;  }".into(),
            result_text: Some("a{color:red}".into()),
            status: Status::Succeeded,
            message: Some(Variant::Css.success_message()),
            progress: 100,
        };
        let summary = build_text_summary(Variant::Css, &session);
        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.lines[0], "CSS minified successfully!");
        assert_eq!(summary.lines[1], "CSS: 15 B -> 12 B (saved 3 B, 20.0%)");
    }

    #[test]
    fn failed_session_has_no_size_line() {
        let session = Session {
            source_text: "a{color:".into(),
            result_text: Some(Variant::Css.failure_sentinel().into()),
            status: Status::Failed,
            message: Some(Variant::Css.failure_message("boom")),
            progress: 30,
        };
        let summary = build_text_summary(Variant::Css, &session);
        assert_eq!(summary.lines, vec!["Failed to minify CSS: boom".to_string()]);
    }
}
