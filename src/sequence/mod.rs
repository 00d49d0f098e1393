// src/sequence/mod.rs

//! Per-device automation sequence.
//!
//! One [`SequenceRunner`] drives exactly one device through the fixed,
//! linear sequence
//!
//! `Start -> WakeDevice -> ResetHome -> LaunchTarget -> AwaitReady -> Navigate -> Done`
//!
//! with early exits to `Cancelled` (stop requested, observed at a step
//! boundary) or `Failed` (command error or readiness timeout).

pub mod commands;
pub mod readiness;
pub mod runner;

use std::fmt;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::errors::SequenceError;

pub use commands::CommandSet;
pub use readiness::{Readiness, ReadinessPolicy, await_ready};
pub use runner::SequenceRunner;

/// Steps that issue commands, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    WakeDevice,
    ResetHome,
    LaunchTarget,
    AwaitReady,
    Navigate,
}

impl Step {
    pub const SEQUENCE: [Step; 5] = [
        Step::WakeDevice,
        Step::ResetHome,
        Step::LaunchTarget,
        Step::AwaitReady,
        Step::Navigate,
    ];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::WakeDevice => "wake device",
            Step::ResetHome => "reset home",
            Step::LaunchTarget => "launch target",
            Step::AwaitReady => "await ready",
            Step::Navigate => "navigate",
        };
        f.write_str(s)
    }
}

/// Terminal classification of one device's sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceOutcome {
    Done,
    Cancelled,
    Failed(SequenceError),
}

impl DeviceOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DeviceOutcome::Failed(_))
    }
}

/// Everything a runner needs besides the executor: the command payloads and
/// the fixed timing of the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePlan {
    pub commands: CommandSet,
    /// Pause after `WakeDevice` and after `ResetHome`.
    pub settle: Duration,
    /// Pause after `Navigate`.
    pub post_navigate: Duration,
    pub readiness: ReadinessPolicy,
}

impl SequencePlan {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            commands: CommandSet::for_target(&cfg.target),
            settle: Duration::from_millis(cfg.sequence.settle_ms),
            post_navigate: Duration::from_millis(cfg.sequence.post_navigate_ms),
            readiness: ReadinessPolicy {
                attempts: cfg.sequence.ready_attempts,
                interval: Duration::from_millis(cfg.sequence.ready_interval_ms),
            },
        }
    }
}

impl Default for SequencePlan {
    fn default() -> Self {
        Self {
            commands: CommandSet::default(),
            settle: Duration::from_millis(500),
            post_navigate: Duration::from_millis(1500),
            readiness: ReadinessPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_matches_default_config() {
        assert_eq!(SequencePlan::default(), SequencePlan::from_config(&ConfigFile::default()));
    }

    #[test]
    fn readiness_error_names_the_failure() {
        let err = SequenceError::ReadinessTimeout { attempts: 5 };
        assert!(err.to_string().contains("target failed to become ready"));
    }
}
