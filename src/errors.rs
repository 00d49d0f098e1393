// src/errors.rs

//! Crate-wide error types.
//!
//! - [`BotError`]: controller / configuration errors surfaced to callers.
//! - [`ExecutionError`]: a single device command failed at the transport layer.
//! - [`SequenceError`]: why one device's sequence ended in `Failed`.

use std::time::Duration;

use thiserror::Error;

use crate::sequence::Step;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("bot is already running")]
    AlreadyRunning,

    #[error("no devices provided")]
    NoDevices,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of one command issued to one device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("non-zero exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("terminated by signal")]
    Terminated,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("io error: {0}")]
    Io(String),

    #[error("{0}")]
    Failed(String),
}

impl From<std::io::Error> for ExecutionError {
    fn from(e: std::io::Error) -> Self {
        ExecutionError::Io(e.to_string())
    }
}

/// Terminal failure of a device sequence. Never propagated to sibling devices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("{step} failed: {source}")]
    Execution {
        step: Step,
        #[source]
        source: ExecutionError,
    },

    #[error("target failed to become ready after {attempts} attempt(s) and fallback check")]
    ReadinessTimeout { attempts: u32 },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BotError>;
