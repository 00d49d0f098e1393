#![allow(dead_code)]

use std::time::Duration;

use phonefarm::sequence::{CommandSet, ReadinessPolicy, SequencePlan};

/// Builder for `SequencePlan` to simplify test setup.
///
/// Starts from the production defaults (500 ms settle, 1500 ms after
/// navigation, 5 probes 700 ms apart).
pub struct PlanBuilder {
    plan: SequencePlan,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self {
            plan: SequencePlan::default(),
        }
    }

    /// All fixed delays set to zero; the poll budget is unchanged.
    pub fn instant() -> Self {
        Self::new()
            .settle(Duration::ZERO)
            .post_navigate(Duration::ZERO)
            .ready_interval(Duration::ZERO)
    }

    pub fn target(mut self, package: &str, marker: &str, url: &str) -> Self {
        self.plan.commands = CommandSet::new(package, marker, url);
        self
    }

    pub fn settle(mut self, d: Duration) -> Self {
        self.plan.settle = d;
        self
    }

    pub fn post_navigate(mut self, d: Duration) -> Self {
        self.plan.post_navigate = d;
        self
    }

    pub fn ready_attempts(mut self, attempts: u32) -> Self {
        self.plan.readiness = ReadinessPolicy {
            attempts,
            ..self.plan.readiness
        };
        self
    }

    pub fn ready_interval(mut self, interval: Duration) -> Self {
        self.plan.readiness = ReadinessPolicy {
            interval,
            ..self.plan.readiness
        };
        self
    }

    pub fn build(self) -> SequencePlan {
        self.plan
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}
