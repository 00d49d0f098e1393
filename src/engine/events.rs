// src/engine/events.rs

//! Publish/subscribe fan-out for log entries and status transitions.
//!
//! Both streams are `tokio::sync::broadcast` channels: any number of
//! subscribers, each sees every event published after it subscribed (unless
//! it lags more than the channel capacity behind). Publishing never blocks
//! and never fails when nobody is listening.

use tokio::sync::broadcast;
use tracing::{error, info};

use crate::types::{DeviceId, LogEntry, LogLevel, RunStatus};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EventHub {
    logs: broadcast::Sender<LogEntry>,
    status: broadcast::Sender<RunStatus>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (logs, _) = broadcast::channel(capacity);
        let (status, _) = broadcast::channel(capacity);
        Self { logs, status }
    }

    pub fn subscribe_logs(&self) -> broadcast::Receiver<LogEntry> {
        self.logs.subscribe()
    }

    pub fn subscribe_status(&self) -> broadcast::Receiver<RunStatus> {
        self.status.subscribe()
    }

    /// Publish a log entry and mirror it into `tracing`.
    pub fn publish_log(&self, entry: LogEntry) {
        match (&entry.level, &entry.device) {
            (LogLevel::Info, Some(device)) => info!(%device, "{}", entry.message),
            (LogLevel::Info, None) => info!("{}", entry.message),
            (LogLevel::Error, Some(device)) => error!(%device, "{}", entry.message),
            (LogLevel::Error, None) => error!("{}", entry.message),
        }

        // No subscribers is fine.
        let _ = self.logs.send(entry);
    }

    pub fn publish_status(&self, status: RunStatus) {
        let _ = self.status.send(status);
    }

    pub fn run_info(&self, message: impl Into<String>) {
        self.publish_log(LogEntry::info(message, None));
    }

    pub fn run_error(&self, message: impl Into<String>) {
        self.publish_log(LogEntry::error(message, None));
    }

    /// Logger that stamps every entry with `device`.
    pub fn device(&self, device: DeviceId) -> DeviceLogger {
        DeviceLogger {
            hub: self.clone(),
            device,
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Device-scoped publishing handle given to each sequence runner.
#[derive(Debug, Clone)]
pub struct DeviceLogger {
    hub: EventHub,
    device: DeviceId,
}

impl DeviceLogger {
    pub fn info(&self, message: impl Into<String>) {
        self.hub
            .publish_log(LogEntry::info(message, Some(self.device.clone())));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.hub
            .publish_log(LogEntry::error(message, Some(self.device.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_sees_every_entry() {
        let hub = EventHub::new(8);
        let mut a = hub.subscribe_logs();
        let mut b = hub.subscribe_logs();

        hub.run_info("starting 1 device(s)");
        hub.device(DeviceId::from("A")).error("failed: boom");

        for rx in [&mut a, &mut b] {
            let first = rx.try_recv().unwrap();
            assert_eq!(first.message, "starting 1 device(s)");
            assert_eq!(first.device, None);

            let second = rx.try_recv().unwrap();
            assert_eq!(second.level, LogLevel::Error);
            assert_eq!(second.device, Some(DeviceId::from("A")));
        }
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let hub = EventHub::default();
        hub.run_info("nobody listens");
        hub.publish_status(RunStatus::Running);

        let mut late = hub.subscribe_status();
        assert!(late.try_recv().is_err());
    }
}
