// src/sequence/runner.rs

//! Device sequence runner.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::DeviceLogger;
use crate::errors::SequenceError;
use crate::exec::DeviceCommandExecutor;
use crate::sequence::readiness::{Readiness, await_ready};
use crate::sequence::{DeviceOutcome, SequencePlan, Step};
use crate::types::DeviceId;

/// Drives one device through the fixed sequence.
///
/// The cancellation token is only *read* here. It is checked before every
/// step; a command that is already in flight always runs to completion.
pub struct SequenceRunner {
    device: DeviceId,
    executor: Arc<dyn DeviceCommandExecutor>,
    plan: Arc<SequencePlan>,
    cancel: CancellationToken,
    log: DeviceLogger,
}

enum Progress {
    Done,
    Cancelled(Step),
}

impl SequenceRunner {
    pub fn new(
        device: DeviceId,
        executor: Arc<dyn DeviceCommandExecutor>,
        plan: Arc<SequencePlan>,
        cancel: CancellationToken,
        log: DeviceLogger,
    ) -> Self {
        Self {
            device,
            executor,
            plan,
            cancel,
            log,
        }
    }

    /// Run the whole sequence. Progress is reported only through the
    /// device-scoped log; the return value is the terminal classification.
    pub async fn run(self) -> DeviceOutcome {
        self.log.info("bot start");

        match self.drive().await {
            Ok(Progress::Done) => {
                self.log.info("bot end");
                DeviceOutcome::Done
            }
            Ok(Progress::Cancelled(next)) => {
                debug!(device = %self.device, next_step = %next, "cancelled at step boundary");
                self.log.info("stopped by request");
                DeviceOutcome::Cancelled
            }
            Err(err) => {
                self.log.error(format!("failed: {err}"));
                DeviceOutcome::Failed(err)
            }
        }
    }

    async fn drive(&self) -> Result<Progress, SequenceError> {
        for step in Step::SEQUENCE {
            if self.cancel.is_cancelled() {
                return Ok(Progress::Cancelled(step));
            }
            debug!(device = %self.device, %step, "step started");
            self.run_step(step).await?;
        }
        Ok(Progress::Done)
    }

    async fn run_step(&self, step: Step) -> Result<(), SequenceError> {
        let commands = &self.plan.commands;

        match step {
            Step::WakeDevice => {
                self.exec(step, commands.wake()).await?;
                tokio::time::sleep(self.plan.settle).await;
            }
            Step::ResetHome => {
                self.exec(step, commands.home()).await?;
                tokio::time::sleep(self.plan.settle).await;
            }
            Step::LaunchTarget => {
                self.exec(step, commands.launch()).await?;
            }
            Step::AwaitReady => {
                let readiness = await_ready(
                    self.executor.as_ref(),
                    &self.device,
                    commands,
                    &self.plan.readiness,
                )
                .await?;

                match readiness {
                    Readiness::Foreground { attempt } => {
                        self.log.info(format!("target active (attempt {attempt})"))
                    }
                    Readiness::ProcessAlive => {
                        self.log.info("target active (process alive)")
                    }
                }
            }
            Step::Navigate => {
                self.exec(step, commands.navigate()).await?;
                tokio::time::sleep(self.plan.post_navigate).await;
                self.log.info(format!("navigated to {}", commands.url()));
            }
        }

        Ok(())
    }

    async fn exec(&self, step: Step, command: &str) -> Result<String, SequenceError> {
        debug!(device = %self.device, %step, %command, "executing");
        self.executor
            .execute(&self.device, command)
            .await
            .map_err(|source| SequenceError::Execution { step, source })
    }
}
