// src/sequence/readiness.rs

//! Bounded readiness polling for the target application.
//!
//! Up to `attempts` foreground probes are issued, `interval` apart. The first
//! probe whose output contains the marker (case-insensitive) wins. When the
//! budget is spent, a single process-existence probe decides: any non-empty
//! output counts as ready. Probe failures are treated as misses.

use std::time::Duration;

use tracing::{debug, trace};

use crate::errors::SequenceError;
use crate::exec::DeviceCommandExecutor;
use crate::sequence::commands::CommandSet;
use crate::types::DeviceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_millis(700),
        }
    }
}

/// How readiness was confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Marker seen in the foreground probe on this (1-based) attempt.
    Foreground { attempt: u32 },
    /// Poll budget exhausted, but the target process exists.
    ProcessAlive,
}

pub fn matches_marker(output: &str, marker: &str) -> bool {
    output.to_lowercase().contains(&marker.to_lowercase())
}

pub async fn await_ready(
    executor: &dyn DeviceCommandExecutor,
    device: &DeviceId,
    commands: &CommandSet,
    policy: &ReadinessPolicy,
) -> Result<Readiness, SequenceError> {
    for attempt in 1..=policy.attempts {
        match executor.execute(device, commands.focus_probe()).await {
            Ok(out) if matches_marker(&out, commands.marker()) => {
                debug!(%device, attempt, "target in foreground");
                return Ok(Readiness::Foreground { attempt });
            }
            Ok(out) => trace!(%device, attempt, focus = %out, "target not in foreground yet"),
            Err(e) => debug!(%device, attempt, error = %e, "foreground probe failed; retrying"),
        }

        tokio::time::sleep(policy.interval).await;
    }

    match executor.execute(device, commands.process_probe()).await {
        Ok(pid) if !pid.trim().is_empty() => {
            debug!(%device, pid = %pid.trim(), "target process alive after poll budget");
            Ok(Readiness::ProcessAlive)
        }
        Ok(_) => Err(SequenceError::ReadinessTimeout {
            attempts: policy.attempts,
        }),
        Err(e) => {
            debug!(%device, error = %e, "fallback probe failed");
            Err(SequenceError::ReadinessTimeout {
                attempts: policy.attempts,
            })
        }
    }
}
