mod export;
mod help;
mod state;

use crate::cli::{build_config, read_input_file, Cli};
use crate::model::{SessionEvent, Status, Variant};
use crate::orchestrator::{self, SessionController, UiCommand};
use crate::storage::DiskSink;
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let initial = read_input_file(&cfg)?.unwrap_or_default();

    // Unbounded channels keep the UI thread from ever blocking on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let mut ctrl = SessionController::new(
        cfg.variant,
        cfg.progress_step,
        Box::new(export::SystemClipboard),
        Box::new(DiskSink::new(cfg.output_dir.clone())),
    );
    ctrl.update_source(initial.clone());
    let variant = ctrl.variant();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(variant, initial, event_rx, cmd_tx));

    let res = orchestrator::run_controller(
        ctrl,
        crate::engine::for_variant(variant),
        cfg.progress_interval,
        event_tx,
        cmd_rx,
    )
    .await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    variant: Variant,
    initial: String,
    mut event_rx: UnboundedReceiver<SessionEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::new(variant, initial);

    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(SessionEvent::Changed(session)) = event_rx.try_recv() {
            state.apply_snapshot(*session);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let edited = match event::read() {
            Ok(Event::Paste(text)) => {
                state.insert_str(&text);
                true
            }
            Ok(Event::Key(k)) => {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Esc) => {
                        if state.show_help {
                            state.show_help = false;
                            false
                        } else {
                            let _ = cmd_tx.send(UiCommand::Quit);
                            break Ok(());
                        }
                    }
                    (_, KeyCode::F(1)) => {
                        state.show_help = !state.show_help;
                        false
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                        let _ = cmd_tx.send(UiCommand::Minify);
                        false
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('l')) => {
                        state.reset_editor();
                        let _ = cmd_tx.send(UiCommand::Clear);
                        false
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('y')) => {
                        let _ = cmd_tx.send(UiCommand::Copy);
                        false
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
                        let _ = cmd_tx.send(UiCommand::Download);
                        false
                    }
                    (_, KeyCode::PageDown) => {
                        state.scroll_output(5);
                        false
                    }
                    (_, KeyCode::PageUp) => {
                        state.scroll_output(-5);
                        false
                    }
                    (_, KeyCode::Enter) => {
                        state.insert_char('\n');
                        true
                    }
                    (_, KeyCode::Tab) => {
                        state.insert_str("  ");
                        true
                    }
                    (_, KeyCode::Backspace) => {
                        state.backspace();
                        true
                    }
                    (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                        state.insert_char(c);
                        true
                    }
                    _ => false,
                }
            }
            _ => false,
        };

        if edited {
            let _ = cmd_tx.send(UiCommand::UpdateSource(state.editor.clone()));
            // Redraw right away so typing does not wait for the next tick.
            last_tick = Instant::now() - tick_rate;
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Percentage(45),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    draw_title(main[0], f, state);
    draw_input(main[1], f, state);
    draw_status(main[2], f, state);
    draw_output(main[3], f, state);
    draw_footer(main[4], f);

    if state.show_help {
        help::draw_help(centered(area, 50, 14), f);
    }
}

fn draw_title(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = vec![Span::styled(
        format!("{} Minifier", state.variant.label()),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if state.is_busy() {
        spans.push(Span::styled(
            "  Minifying…",
            Style::default().fg(Color::Yellow),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_input(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Input");
    let inner_height = area.height.saturating_sub(2);

    if state.editor.is_empty() {
        let placeholder = Paragraph::new(Span::styled(
            format!("Paste your {} here...", state.variant.label()),
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(placeholder, area);
        f.set_cursor_position((area.x + 1, area.y + 1));
        return;
    }

    let scroll = state::tail_scroll(&state.editor, inner_height);
    let p = Paragraph::new(state.editor.as_str())
        .block(block)
        .scroll((scroll, 0));
    f.render_widget(p, area);

    // The cursor sits at the end of the buffer.
    let last_line = state.editor.rsplit('\n').next().unwrap_or("");
    let row = (state::line_count(&state.editor) as u16)
        .saturating_sub(1)
        .saturating_sub(scroll);
    let col = (last_line.chars().count() as u16).min(area.width.saturating_sub(3));
    f.set_cursor_position((area.x + 1 + col, area.y + 1 + row.min(inner_height.saturating_sub(1))));
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(area);

    let banner = state
        .session
        .message
        .clone()
        .unwrap_or_else(|| match state.session.status {
            Status::Running => "Working…".to_string(),
            _ => "Ctrl-R to minify, F1 for help".to_string(),
        });
    let p = Paragraph::new(Span::styled(
        banner,
        Style::default().fg(state.banner_color()),
    ))
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, row[0]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(state.banner_color()))
        .percent(u16::from(state.session.progress.min(100)));
    f.render_widget(gauge, row[1]);
}

fn draw_output(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut title = vec![Span::raw(format!("Minified {}", state.variant.label()))];
    if let Some(size) = state.size_summary() {
        title.push(Span::raw(" ("));
        title.push(Span::styled(
            format!(
                "{} -> {}, -{:.1}%",
                crate::metrics::format_bytes(size.original_bytes),
                crate::metrics::format_bytes(size.minified_bytes),
                size.saved_ratio * 100.0
            ),
            Style::default().fg(Color::Cyan),
        ));
        title.push(Span::raw(")"));
    }
    let block = Block::default().borders(Borders::ALL).title(Line::from(title));

    let body = match (state.session.status, state.session.result_text.as_deref()) {
        (Status::Failed, Some(text)) => Paragraph::new(Span::styled(
            text.to_string(),
            Style::default().fg(Color::Red),
        )),
        (Status::Succeeded, Some(text)) => Paragraph::new(text.to_string()),
        _ => Paragraph::new(Span::styled(
            "No result yet",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(
        body.block(block)
            .wrap(Wrap { trim: false })
            .scroll((state.output_scroll, 0)),
        area,
    );
}

fn draw_footer(area: Rect, f: &mut ratatui::Frame) {
    let key = Style::default().fg(Color::Magenta);
    let line = Line::from(vec![
        Span::styled("^R", key),
        Span::raw(" minify  "),
        Span::styled("^L", key),
        Span::raw(" clear  "),
        Span::styled("^Y", key),
        Span::raw(" copy  "),
        Span::styled("^S", key),
        Span::raw(" save  "),
        Span::styled("F1", key),
        Span::raw(" help  "),
        Span::styled("Esc", key),
        Span::raw(" quit"),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// A `width` x `height` rectangle centred in `area`, clamped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}
