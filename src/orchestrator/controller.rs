//! Minify session lifecycle controller.
//!
//! Owns the single [`Session`] record, serializes start/clear/copy/download, and emits
//! snapshots for presentation layers.

use crate::engine::{Minifier, MinifyError};
use crate::model::{Session, SessionEvent, Status, Variant};
use crate::storage::{ClipboardSink, FileSink};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Duration, MissedTickBehavior};

/// Commands emitted by UI layers to drive the session.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    UpdateSource(String),
    Minify,
    Clear,
    Copy,
    Download,
    Quit,
}

/// A minify call the driver must run. `generation` identifies it for the staleness check.
#[derive(Debug)]
pub(crate) struct MinifyRequest {
    pub generation: u64,
    pub source: String,
}

/// The only mutator of [`Session`].
pub(crate) struct SessionController {
    session: Session,
    variant: Variant,
    progress_step: u8,
    // Bumped on every start and every clear; completions carrying an older value are stale.
    generation: u64,
    clipboard: Box<dyn ClipboardSink>,
    files: Box<dyn FileSink>,
}

impl SessionController {
    pub fn new(
        variant: Variant,
        progress_step: u8,
        clipboard: Box<dyn ClipboardSink>,
        files: Box<dyn FileSink>,
    ) -> Self {
        Self {
            session: Session::default(),
            variant,
            progress_step: progress_step.max(1),
            generation: 0,
            clipboard,
            files,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn update_source(&mut self, text: String) {
        self.session.source_text = text;
    }

    /// Begin a request, or return `None` when the source is empty or one is already running.
    pub fn start_minify(&mut self) -> Option<MinifyRequest> {
        if self.session.source_text.is_empty() || self.session.status == Status::Running {
            tracing::debug!(status = ?self.session.status, "minify request ignored");
            return None;
        }
        self.generation += 1;
        self.session.status = Status::Running;
        self.session.message = None;
        self.session.progress = 0;
        tracing::info!(
            generation = self.generation,
            bytes = self.session.source_text.len(),
            variant = ?self.variant,
            "minify started"
        );
        Some(MinifyRequest {
            generation: self.generation,
            source: self.session.source_text.clone(),
        })
    }

    /// Apply a minifier outcome. Returns `false` when the outcome was stale and discarded.
    pub fn complete(&mut self, generation: u64, outcome: Result<String, MinifyError>) -> bool {
        if generation != self.generation || self.session.status != Status::Running {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding stale minify result"
            );
            return false;
        }
        match outcome {
            Ok(code) => {
                tracing::info!(generation, bytes = code.len(), "minify succeeded");
                self.session.result_text = Some(code);
                self.session.status = Status::Succeeded;
                self.session.message = Some(self.variant.success_message());
                self.session.progress = 100;
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "minify failed");
                self.session.result_text = Some(self.variant.failure_sentinel().to_string());
                self.session.status = Status::Failed;
                self.session.message = Some(self.variant.failure_message(&e.to_string()));
            }
        }
        true
    }

    /// Advance the cosmetic progress bar. Returns `true` if the session changed.
    pub fn tick_progress(&mut self) -> bool {
        if self.session.status != Status::Running || self.session.progress >= 100 {
            return false;
        }
        self.session.progress = self.session.progress.saturating_add(self.progress_step).min(100);
        true
    }

    pub fn clear(&mut self) {
        if self.session.status == Status::Running {
            tracing::info!(generation = self.generation, "clearing while a request is in flight");
        }
        self.generation += 1;
        self.session = Session::default();
    }

    /// Successful output only; the failure sentinel is never copied or saved.
    fn deliverable(&self) -> Option<&str> {
        match self.session.status {
            Status::Succeeded => self.session.result_text.as_deref(),
            _ => None,
        }
    }

    /// Copy the result to the clipboard. Returns `false` when there is nothing to copy.
    pub fn copy_result(&mut self) -> bool {
        let Some(text) = self.deliverable() else {
            tracing::debug!("copy ignored: no successful result");
            return false;
        };
        let message = match self.clipboard.write_text(text) {
            Ok(()) => "Copied to clipboard!".to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "clipboard write failed");
                format!("Copy failed: {e:#}")
            }
        };
        self.session.message = Some(message);
        true
    }

    /// Save the result under the variant's file name. Returns `false` when there is nothing to save.
    pub fn download_result(&mut self) -> bool {
        let Some(text) = self.deliverable() else {
            tracing::debug!("download ignored: no successful result");
            return false;
        };
        let message = match self.files.save(self.variant.download_file_name(), text.as_bytes()) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "result saved");
                format!("Saved: {}", path.display())
            }
            Err(e) => {
                tracing::warn!(error = %e, "save failed");
                format!("Save failed: {e:#}")
            }
        };
        self.session.message = Some(message);
        true
    }
}

fn publish(event_tx: &UnboundedSender<SessionEvent>, ctrl: &SessionController) {
    let _ = event_tx.send(SessionEvent::Changed(Box::new(ctrl.session().clone())));
}

/// Drive a [`SessionController`] from UI commands, run minify calls, tick progress and
/// emit snapshots back to presentation layers.
pub(crate) async fn run_controller(
    mut ctrl: SessionController,
    minifier: Arc<dyn Minifier>,
    progress_interval: Duration,
    event_tx: UnboundedSender<SessionEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    // Completions are routed through a channel so a stale task can finish on its own
    // without the loop holding its JoinHandle.
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(u64, Result<String, MinifyError>)>();
    let mut ticker = tokio::time::interval(progress_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    publish(&event_tx, &ctrl);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::UpdateSource(text)) => ctrl.update_source(text),
                    Some(UiCommand::Minify) => {
                        let Some(req) = ctrl.start_minify() else {
                            continue;
                        };
                        ticker.reset();
                        let fut = minifier.minify(req.source);
                        let done_tx = done_tx.clone();
                        tokio::spawn(async move {
                            let outcome = fut.await;
                            let _ = done_tx.send((req.generation, outcome));
                        });
                    }
                    Some(UiCommand::Clear) => ctrl.clear(),
                    Some(UiCommand::Copy) => {
                        if !ctrl.copy_result() {
                            continue;
                        }
                    }
                    Some(UiCommand::Download) => {
                        if !ctrl.download_result() {
                            continue;
                        }
                    }
                    Some(UiCommand::Quit) | None => break,
                }
                publish(&event_tx, &ctrl);
            }
            Some((generation, outcome)) = done_rx.recv() => {
                if ctrl.complete(generation, outcome) {
                    publish(&event_tx, &ctrl);
                }
            }
            _ = ticker.tick(), if ctrl.session().status == Status::Running => {
                if ctrl.tick_progress() {
                    publish(&event_tx, &ctrl);
                }
            }
        }
    }

    Ok(())
}
