pub mod builders;
pub mod fake_executor;

use std::sync::Once;
use std::time::Duration;

use phonefarm::types::{LogEntry, RunStatus};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 30-second timeout.
///
/// Under `start_paused = true` the clock auto-advances, so this fires
/// instantly if the future can never complete.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(30), f)
        .await
        .expect("Test timed out after 30 seconds")
}

/// Take every entry currently buffered in `rx`.
pub fn drain_logs(rx: &mut broadcast::Receiver<LogEntry>) -> Vec<LogEntry> {
    let mut out = Vec::new();
    while let Ok(entry) = rx.try_recv() {
        out.push(entry);
    }
    out
}

/// Take every status transition currently buffered in `rx`.
pub fn drain_status(rx: &mut broadcast::Receiver<RunStatus>) -> Vec<RunStatus> {
    let mut out = Vec::new();
    while let Ok(status) = rx.try_recv() {
        out.push(status);
    }
    out
}

/// Messages of all entries scoped to `device`, in emission order.
pub fn messages_for(entries: &[LogEntry], device: &str) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.device.as_ref().is_some_and(|d| d.as_str() == device))
        .map(|e| e.message.clone())
        .collect()
}

/// Messages of all run-level entries (no device), in emission order.
pub fn run_messages(entries: &[LogEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.device.is_none())
        .map(|e| e.message.clone())
        .collect()
}
