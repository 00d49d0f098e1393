// src/types.rs

//! Shared domain types: device identifiers, aggregate run status and the
//! log entries published on the event stream.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a device (an ADB serial in production).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Aggregate status of the current (or most recent) run.
///
/// Only the controller writes it; runners never touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Severity of a published [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => f.write_str("info"),
            LogLevel::Error => f.write_str("error"),
        }
    }
}

/// Immutable progress record.
///
/// `device` is `None` for run-level messages emitted by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub device: Option<DeviceId>,
}

impl LogEntry {
    pub fn info(message: impl Into<String>, device: Option<DeviceId>) -> Self {
        Self::new(LogLevel::Info, message, device)
    }

    pub fn error(message: impl Into<String>, device: Option<DeviceId>) -> Self {
        Self::new(LogLevel::Error, message, device)
    }

    fn new(level: LogLevel, message: impl Into<String>, device: Option<DeviceId>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            device,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp.format("%H:%M:%S%.3f");
        match &self.device {
            Some(device) => write!(f, "{ts} {:<5} [{device}] {}", self.level, self.message),
            None => write!(f, "{ts} {:<5} {}", self.level, self.message),
        }
    }
}
