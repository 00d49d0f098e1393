// src/sink.rs

//! Terminal event sink used by the CLI.
//!
//! Subscribes to the controller's log and status streams and prints every
//! event to STDOUT, either as text or as one JSON object per line.

use std::io::Write;

use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::types::{LogEntry, RunStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Render one log entry in the given format.
pub fn render_log(entry: &LogEntry, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => entry.to_string(),
        OutputFormat::Json => json!({ "type": "log", "entry": entry }).to_string(),
    }
}

/// Render one status transition in the given format.
pub fn render_status(status: RunStatus, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("status: {status}"),
        OutputFormat::Json => json!({ "type": "status", "status": status }).to_string(),
    }
}

/// Print events until `shutdown` fires, then flush whatever is still
/// buffered in both receivers and return.
pub fn spawn_printer(
    mut logs: broadcast::Receiver<LogEntry>,
    mut status: broadcast::Receiver<RunStatus>,
    format: OutputFormat,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = logs.recv() => match res {
                    Ok(entry) => emit(&render_log(&entry, format)),
                    Err(RecvError::Lagged(n)) => warn!(skipped = n, "event printer lagged behind log stream"),
                    Err(RecvError::Closed) => break,
                },
                res = status.recv() => match res {
                    Ok(s) => emit(&render_status(s, format)),
                    Err(RecvError::Lagged(n)) => warn!(skipped = n, "event printer lagged behind status stream"),
                    Err(RecvError::Closed) => break,
                },
                _ = shutdown.cancelled() => break,
            }
        }

        drain(&mut logs, |entry| emit(&render_log(&entry, format)));
        drain(&mut status, |s| emit(&render_status(s, format)));
        debug!("event printer finished");
    })
}

fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>, mut f: impl FnMut(T)) {
    loop {
        match rx.try_recv() {
            Ok(value) => f(value),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn emit(line: &str) {
    let mut out = std::io::stdout().lock();
    // A closed stdout (e.g. `| head`) must not take the run down.
    let _ = writeln!(out, "{line}");
}
