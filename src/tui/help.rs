use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn key_line(key: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{key:<10}"), Style::default().fg(Color::Magenta)),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("Ctrl-R", "Minify"),
        key_line("Ctrl-L", "Clear input and result"),
        key_line("Ctrl-Y", "Copy result to clipboard"),
        key_line("Ctrl-S", "Save result to file"),
        key_line("PgUp/PgDn", "Scroll result"),
        key_line("F1", "Toggle this help"),
        key_line("Esc", "Close help / Quit"),
        key_line("Ctrl-C", "Quit"),
        Line::from(""),
        Line::from("Typing and pasting go to the input pane."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
