use crate::storage::ClipboardSink;
use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

/// How long a clipboard instance stays alive after a copy, so clipboard managers on
/// Linux have time to read the contents.
const HOLD: Duration = Duration::from_secs(2);
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

struct ClipboardRequest {
    text: String,
    reply: std_mpsc::Sender<Result<()>>,
}

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<ClipboardRequest>> = OnceLock::new();

/// System clipboard backed by `arboard`.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        copy_to_clipboard(text)
    }
}

/// Spawn a thread that performs clipboard writes sequentially.
///
/// `set_text` returns a guard (the live clipboard instance) that is kept until the next
/// request or until `hold` elapses with no request. The outcome is replied before the
/// guard is held, so callers never wait on the hold period.
fn spawn_manager<F, G>(mut set_text: F, hold: Duration) -> std_mpsc::Sender<ClipboardRequest>
where
    F: FnMut(&str) -> Result<G> + Send + 'static,
    G: 'static,
{
    let (tx, rx) = std_mpsc::channel::<ClipboardRequest>();

    std::thread::spawn(move || {
        let mut held: Option<G> = None;
        loop {
            match rx.recv_timeout(hold) {
                Ok(req) => {
                    held = None;
                    let outcome = match set_text(&req.text) {
                        Ok(guard) => {
                            held = Some(guard);
                            Ok(())
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "clipboard write failed");
                            Err(e)
                        }
                    };
                    let _ = req.reply.send(outcome);
                }
                Err(std_mpsc::RecvTimeoutError::Timeout) => held = None,
                Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        drop(held);
    });

    tx
}

fn arboard_set_text(text: &str) -> Result<arboard::Clipboard> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| anyhow::anyhow!("clipboard unavailable: {e}"))?;
    clipboard
        .set_text(text)
        .map_err(|e| anyhow::anyhow!("clipboard write failed: {e}"))?;
    Ok(clipboard)
}

/// Queue `text` on a manager and wait for the platform's verdict.
fn request(sender: &std_mpsc::Sender<ClipboardRequest>, text: &str) -> Result<()> {
    let (reply_tx, reply_rx) = std_mpsc::channel();
    sender
        .send(ClipboardRequest {
            text: text.to_string(),
            reply: reply_tx,
        })
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    reply_rx
        .recv_timeout(REPLY_TIMEOUT)
        .map_err(|_| anyhow::anyhow!("Clipboard manager did not respond"))?
}

/// Copy text to the system clipboard, reporting platform failures to the caller.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = CLIPBOARD_SENDER.get_or_init(|| spawn_manager(arboard_set_text, HOLD));
    request(sender, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn platform_failure_is_returned_to_caller() {
        let sender = spawn_manager(
            |_text: &str| -> Result<()> { Err(anyhow::anyhow!("no display")) },
            Duration::from_millis(50),
        );
        let err = request(&sender, "a{}").unwrap_err();
        assert!(format!("{err:#}").contains("no display"));
    }

    #[test]
    fn successful_write_replies_without_waiting_for_hold() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = written.clone();
        let sender = spawn_manager(
            move |text: &str| -> Result<()> {
                sink.lock().unwrap().push(text.to_string());
                Ok(())
            },
            Duration::from_secs(60),
        );

        let started = std::time::Instant::now();
        request(&sender, "first").unwrap();
        request(&sender, "second").unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(*written.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn closed_manager_reports_error() {
        let (tx, rx) = std_mpsc::channel::<ClipboardRequest>();
        drop(rx);
        assert!(request(&tx, "x").is_err());
    }
}
