use crate::metrics::{self, SizeSummary};
use crate::model::{Session, Status, Variant};
use ratatui::style::Color;

pub struct UiState {
    pub variant: Variant,
    // Local edit buffer. The UI thread is the only writer; every edit is forwarded to
    // the controller, and snapshots never overwrite it so in-flight keystrokes are not lost.
    pub editor: String,
    // Latest snapshot from the controller.
    pub session: Session,
    pub show_help: bool,
    pub output_scroll: u16,
}

impl UiState {
    pub fn new(variant: Variant, editor: String) -> Self {
        Self {
            variant,
            session: Session {
                source_text: editor.clone(),
                ..Default::default()
            },
            editor,
            show_help: false,
            output_scroll: 0,
        }
    }

    pub fn apply_snapshot(&mut self, session: Session) {
        // A new result starts at the top of the output pane.
        if session.result_text != self.session.result_text {
            self.output_scroll = 0;
        }
        self.session = session;
    }

    pub fn insert_char(&mut self, c: char) {
        self.editor.push(c);
    }

    /// Insert pasted text, normalising Windows and old Mac line endings.
    pub fn insert_str(&mut self, text: &str) {
        let normalised = text.replace("\r\n", "\n").replace('\r', "\n");
        self.editor.push_str(&normalised);
    }

    pub fn backspace(&mut self) {
        self.editor.pop();
    }

    pub fn reset_editor(&mut self) {
        self.editor.clear();
        self.output_scroll = 0;
    }

    pub fn scroll_output(&mut self, delta: i32) {
        let next = (self.output_scroll as i32 + delta).max(0);
        self.output_scroll = next.min(u16::MAX as i32) as u16;
    }

    pub fn is_busy(&self) -> bool {
        self.session.status == Status::Running
    }

    pub fn size_summary(&self) -> Option<SizeSummary> {
        if self.session.status != Status::Succeeded {
            return None;
        }
        self.session
            .result_text
            .as_deref()
            .map(|code| metrics::compute_size_summary(&self.session.source_text, code))
    }

    pub fn banner_color(&self) -> Color {
        match self.session.status {
            Status::Succeeded => Color::Green,
            Status::Failed => Color::Red,
            Status::Running => Color::Yellow,
            Status::Idle => Color::Gray,
        }
    }
}

/// Number of rendered lines in `text` (a trailing newline opens a new, empty line).
pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

/// Scroll offset that keeps the last line of `text` visible in `height` rows.
pub fn tail_scroll(text: &str, height: u16) -> u16 {
    let lines = line_count(text) as u16;
    lines.saturating_sub(height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paste_normalises_line_endings() {
        let mut s = UiState::new(Variant::Css, String::new());
        s.insert_str("a {\r\n  color: red;\r}");
        assert_eq!(s.editor, "a {\n  color: red;\n}");
    }

    #[test]
    fn backspace_removes_whole_char() {
        let mut s = UiState::new(Variant::Js, "é".into());
        s.backspace();
        assert_eq!(s.editor, "");
        s.backspace();
        assert_eq!(s.editor, "");
    }

    #[test]
    fn new_result_resets_scroll() {
        let mut s = UiState::new(Variant::Css, String::new());
        s.scroll_output(5);
        s.apply_snapshot(Session {
            result_text: Some("a{}".into()),
            status: Status::Succeeded,
            ..Default::default()
        });
        assert_eq!(s.output_scroll, 0);
        s.scroll_output(-3);
        assert_eq!(s.output_scroll, 0);
    }

    #[test]
    fn tail_scroll_keeps_last_line_visible() {
        assert_eq!(tail_scroll("", 3), 0);
        assert_eq!(tail_scroll("a\nb\nc\nd\ne", 3), 2);
        assert_eq!(tail_scroll("a\n", 1), 1);
    }
}
