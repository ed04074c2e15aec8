use crate::model::{MinifyReport, Session, SessionConfig, SessionEvent, Status, Variant};
use crate::orchestrator::{run_controller, SessionController, UiCommand};
use crate::storage::{DiskSink, NoClipboard};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "minify-cli",
    version,
    about = "CSS and JavaScript minifier with optional TUI"
)]
pub struct Cli {
    /// Language to minify (inferred from --input when omitted, else css)
    #[arg(long, value_enum)]
    pub lang: Option<Variant>,

    /// Read source from this file (stdin in --text/--json mode when omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Write minified code to this file instead of stdout (--text/--json)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Directory where the TUI saves minified results
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Minify once and print the result (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Minify once and print a JSON report (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Interval between progress bar steps
    #[arg(long, default_value = "150ms")]
    pub progress_interval: humantime::Duration,

    /// Progress bar step in percent
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub progress_step: u8,

    /// Log file for the TUI (defaults to the local data directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `minify_cli=trace` (overridden by MINIFY_LOG)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub async fn run(args: Cli) -> Result<()> {
    if args.text && args.json {
        return Err(anyhow::anyhow!(
            "--text and --json are mutually exclusive. Pick one output mode."
        ));
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            let log_path = args
                .log_file
                .clone()
                .unwrap_or_else(crate::storage::default_log_path);
            crate::logging::init_file(&log_path, args.log_level.as_deref().unwrap_or("info"))?;
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            crate::logging::init_stderr(args.log_level.as_deref().unwrap_or("warn"));
            return run_once(args, false).await;
        }
    }

    crate::logging::init_stderr(args.log_level.as_deref().unwrap_or("warn"));
    let json = args.json;
    run_once(args, json).await
}

/// Build a `SessionConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> SessionConfig {
    let variant = args
        .lang
        .or_else(|| args.input.as_deref().and_then(Variant::from_path))
        .unwrap_or_default();
    SessionConfig {
        variant,
        input: args.input.clone(),
        output: args.output.clone(),
        output_dir: args.output_dir.clone(),
        progress_interval: Duration::from(args.progress_interval),
        progress_step: args.progress_step,
    }
}

/// Load the initial source text from `--input`, if given.
pub fn read_input_file(cfg: &SessionConfig) -> Result<Option<String>> {
    cfg.input
        .as_deref()
        .map(|p| {
            std::fs::read_to_string(p).with_context(|| format!("read input {}", p.display()))
        })
        .transpose()
}

async fn read_source(cfg: &SessionConfig) -> Result<String> {
    if let Some(text) = read_input_file(cfg)? {
        return Ok(text);
    }
    tokio::task::spawn_blocking(|| {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read source from stdin")?;
        Ok::<_, anyhow::Error>(buf)
    })
    .await
    .context("stdin reader task failed")?
}

/// Drive one minify request through the session controller and wait for it to resolve.
async fn minify_once(cfg: &SessionConfig, source: String) -> Result<Session> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let ctrl = SessionController::new(
        cfg.variant,
        cfg.progress_step,
        Box::new(NoClipboard),
        Box::new(DiskSink::new(cfg.output_dir.clone())),
    );
    let minifier = crate::engine::for_variant(cfg.variant);
    let handle = tokio::spawn(run_controller(
        ctrl,
        minifier,
        cfg.progress_interval,
        event_tx,
        cmd_rx,
    ));

    let _ = cmd_tx.send(UiCommand::UpdateSource(source));
    let _ = cmd_tx.send(UiCommand::Minify);

    let mut resolved = None;
    while let Some(SessionEvent::Changed(s)) = event_rx.recv().await {
        if s.status.is_resolved() {
            resolved = Some(*s);
            let _ = cmd_tx.send(UiCommand::Quit);
        }
    }

    handle.await.context("controller task failed")??;
    resolved.context("minify request never resolved")
}

async fn run_once(args: Cli, json: bool) -> Result<()> {
    let cfg = build_config(&args);
    let source = read_source(&cfg).await?;
    ensure_source(cfg.variant, &source)?;

    let session = minify_once(&cfg, source).await?;
    let (out_tx, out_handle) = spawn_output_writer();

    let code = match session.status {
        Status::Succeeded => session.result_text.clone(),
        _ => None,
    };
    if let (Some(path), Some(code)) = (cfg.output.as_deref(), code.as_deref()) {
        crate::storage::write_file(path, code.as_bytes())?;
        let _ = out_tx.send(OutputLine::Stderr(format!("Saved: {}", path.display())));
    }

    if json {
        let report = build_report(cfg.variant, &session, cfg.output.is_none());
        let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(&report)?));
    } else {
        if cfg.output.is_none() {
            if let Some(code) = code.as_deref() {
                let _ = out_tx.send(OutputLine::Stdout(code.to_string()));
            }
        }
        let summary = crate::text_summary::build_text_summary(cfg.variant, &session);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stderr(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;

    // The failure message is already on stderr; exit without repeating it.
    if let Some(code) = exit_code(session.status) {
        std::process::exit(code);
    }
    Ok(())
}

/// Minify is only refused for empty input; whitespace-only source is still minified.
fn ensure_source(variant: Variant, source: &str) -> Result<()> {
    if source.is_empty() {
        return Err(anyhow::anyhow!("no {} source to minify", variant.label()));
    }
    Ok(())
}

/// Process exit code for a resolved session, `None` on success.
fn exit_code(status: Status) -> Option<i32> {
    match status {
        Status::Failed => Some(1),
        _ => None,
    }
}

/// Build the `--json` report. `include_code` is false when the code went to `--output`.
pub(crate) fn build_report(variant: Variant, session: &Session, include_code: bool) -> MinifyReport {
    let succeeded = session.status == Status::Succeeded;
    let size = session
        .result_text
        .as_deref()
        .filter(|_| succeeded)
        .map(|code| crate::metrics::compute_size_summary(&session.source_text, code));
    MinifyReport {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        variant,
        status: session.status,
        original_bytes: session.source_text.len() as u64,
        minified_bytes: size.map(|s| s.minified_bytes),
        saved_ratio: size.map(|s| s.saved_ratio),
        code: if include_code {
            session.result_text.clone()
        } else {
            None
        },
        message: session.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("minify-cli").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn variant_inferred_from_input_extension() {
        assert_eq!(build_config(&parse(&["--input", "app.js"])).variant, Variant::Js);
        assert_eq!(build_config(&parse(&["--input", "site.css"])).variant, Variant::Css);
        assert_eq!(build_config(&parse(&[])).variant, Variant::Css);
    }

    #[test]
    fn explicit_lang_wins() {
        let cfg = build_config(&parse(&["--lang", "css", "--input", "app.js"]));
        assert_eq!(cfg.variant, Variant::Css);
    }

    #[test]
    fn progress_defaults() {
        let cfg = build_config(&parse(&[]));
        assert_eq!(cfg.progress_interval, Duration::from_millis(150));
        assert_eq!(cfg.progress_step, 10);
        assert!(Cli::try_parse_from(["minify-cli", "--progress-step", "0"]).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn minify_once_css_scenario() {
        let cfg = build_config(&parse(&["--lang", "css"]));
        let session = minify_once(&cfg, "a{color:red;  }".into()).await.unwrap();
        assert_eq!(session.status, Status::Succeeded);
        assert_eq!(session.result_text.as_deref(), Some("a{color:red}"));
        assert_eq!(session.progress, 100);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn minify_once_js_scenario() {
        let input = "function f(){ console.log( 'x' ) }";
        let cfg = build_config(&parse(&["--lang", "js"]));
        let session = minify_once(&cfg, input.into()).await.unwrap();
        assert_eq!(session.status, Status::Succeeded);
        let out = session.result_text.unwrap();
        assert!(out.len() < input.len());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn minify_once_css_malformed_input_fails() {
        let cfg = build_config(&parse(&["--lang", "css"]));
        let session = minify_once(&cfg, "a{color:".into()).await.unwrap();
        assert_eq!(session.status, Status::Failed);
        assert_eq!(session.result_text.as_deref(), Some("Invalid CSS"));
        assert!(session
            .message
            .as_deref()
            .unwrap()
            .starts_with("Failed to minify CSS"));
        assert_eq!(exit_code(session.status), Some(1));
    }

    #[test]
    fn whitespace_only_source_is_accepted() {
        assert!(ensure_source(Variant::Css, "  \n").is_ok());
        assert!(ensure_source(Variant::Css, "").is_err());
    }

    #[test]
    fn only_failure_exits_non_zero() {
        assert_eq!(exit_code(Status::Succeeded), None);
        assert_eq!(exit_code(Status::Failed), Some(1));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn minify_once_reports_failure_sentinel() {
        let cfg = build_config(&parse(&["--lang", "js"]));
        let session = minify_once(&cfg, "function f( {".into()).await.unwrap();
        assert_eq!(session.status, Status::Failed);
        assert_eq!(session.result_text.as_deref(), Some("Invalid JavaScript"));

        let report = build_report(cfg.variant, &session, true);
        assert_eq!(report.minified_bytes, None);
        assert_eq!(report.code.as_deref(), Some("Invalid JavaScript"));
    }

    #[test]
    fn report_omits_code_when_written_to_file() {
        let session = Session {
            source_text: "a { }".into(),
            result_text: Some("a{}".into()),
            status: Status::Succeeded,
            message: None,
            progress: 100,
        };
        let report = build_report(Variant::Css, &session, false);
        assert_eq!(report.code, None);
        assert_eq!(report.original_bytes, 5);
        assert_eq!(report.minified_bytes, Some(3));
    }
}
