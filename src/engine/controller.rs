// src/engine/controller.rs

//! Run controller: owns the aggregate status and the lifecycle of runs.
//!
//! - `start_bot` launches one [`SequenceRunner`] per device and returns
//!   immediately; a background aggregation task waits for all of them.
//! - `stop_bot` is best-effort and non-blocking: it flips the run's
//!   cancellation token and reports `Idle` at once. Runners notice at their
//!   next step boundary.
//! - Only this module writes `RunStatus`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::anyhow;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::engine::events::{DEFAULT_EVENT_CAPACITY, EventHub};
use crate::engine::session::{RunSession, unique_devices};
use crate::errors::{BotError, Result};
use crate::exec::DeviceCommandExecutor;
use crate::sequence::{DeviceOutcome, SequencePlan, SequenceRunner};
use crate::types::{DeviceId, LogEntry, RunStatus};

/// Cheaply cloneable handle to the single controller of a process.
///
/// Construct it once and pass clones to whoever needs to start, stop or
/// observe runs.
#[derive(Clone)]
pub struct BotController {
    inner: Arc<Inner>,
}

struct Inner {
    executor: Arc<dyn DeviceCommandExecutor>,
    plan: Arc<SequencePlan>,
    events: EventHub,
    /// Runtime the runners are spawned on. Captured at construction so that
    /// `start_bot` works from threads that are not running Tokio.
    runtime: Option<Handle>,
    state: Mutex<ControllerState>,
    /// Number of runs whose runners have not all drained yet.
    in_flight: watch::Sender<usize>,
}

#[derive(Debug, Default)]
struct ControllerState {
    status: RunStatus,
    last_run_id: u64,
    session: Option<RunSession>,
}

impl std::fmt::Debug for BotController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotController")
            .field("state", &*self.inner.lock_state())
            .field("plan", &self.inner.plan)
            .finish_non_exhaustive()
    }
}

impl BotController {
    pub fn new(executor: Arc<dyn DeviceCommandExecutor>, plan: SequencePlan) -> Self {
        Self::with_capacity(executor, plan, DEFAULT_EVENT_CAPACITY)
    }

    /// Binds to the ambient Tokio runtime, if there is one. Without one,
    /// `start_bot` falls back to the caller's runtime; use [`Self::with_handle`]
    /// to build a controller outside any runtime.
    pub fn with_capacity(
        executor: Arc<dyn DeviceCommandExecutor>,
        plan: SequencePlan,
        event_capacity: usize,
    ) -> Self {
        Self::build(executor, plan, event_capacity, Handle::try_current().ok())
    }

    /// Spawn every run on `runtime`, whichever thread calls `start_bot`.
    pub fn with_handle(
        executor: Arc<dyn DeviceCommandExecutor>,
        plan: SequencePlan,
        event_capacity: usize,
        runtime: Handle,
    ) -> Self {
        Self::build(executor, plan, event_capacity, Some(runtime))
    }

    fn build(
        executor: Arc<dyn DeviceCommandExecutor>,
        plan: SequencePlan,
        event_capacity: usize,
        runtime: Option<Handle>,
    ) -> Self {
        let (in_flight, _) = watch::channel(0usize);
        Self {
            inner: Arc::new(Inner {
                executor,
                plan: Arc::new(plan),
                events: EventHub::new(event_capacity),
                runtime,
                state: Mutex::new(ControllerState::default()),
                in_flight,
            }),
        }
    }

    pub fn from_config(executor: Arc<dyn DeviceCommandExecutor>, cfg: &ConfigFile) -> Self {
        Self::with_capacity(executor, SequencePlan::from_config(cfg), cfg.events.capacity)
    }

    /// Start a run for `devices` (duplicates are ignored).
    ///
    /// Fails with [`BotError::AlreadyRunning`] while a run is `Running` and
    /// with [`BotError::NoDevices`] for an empty set. On success all runners
    /// are already spawned; the outcome arrives through the event streams.
    ///
    /// Callable from any thread. Runs are spawned on the runtime the
    /// controller was bound to, or on the caller's runtime if it has none.
    pub fn start_bot(&self, devices: impl IntoIterator<Item = DeviceId>) -> Result<()> {
        let devices = unique_devices(devices);
        let runtime = match &self.inner.runtime {
            Some(handle) => handle.clone(),
            None => Handle::try_current()
                .map_err(|e| BotError::Other(anyhow!("start_bot needs a Tokio runtime: {e}")))?,
        };

        let (run_id, cancel) = {
            let mut state = self.inner.lock_state();
            if state.status == RunStatus::Running {
                return Err(BotError::AlreadyRunning);
            }
            if devices.is_empty() {
                return Err(BotError::NoDevices);
            }

            state.last_run_id += 1;
            let session = RunSession::new(state.last_run_id, &devices);
            let ids = (session.run_id, session.cancel.clone());
            state.session = Some(session);
            self.inner.in_flight.send_modify(|n| *n += 1);
            self.inner.transition(&mut state, RunStatus::Running);
            ids
        };

        info!(run_id, devices = devices.len(), "run started");
        self.inner
            .events
            .run_info(format!("starting bot for {} device(s)", devices.len()));

        let runners: Vec<(DeviceId, JoinHandle<DeviceOutcome>)> = devices
            .into_iter()
            .map(|device| {
                let runner = SequenceRunner::new(
                    device.clone(),
                    Arc::clone(&self.inner.executor),
                    Arc::clone(&self.inner.plan),
                    cancel.clone(),
                    self.inner.events.device(device.clone()),
                );
                let inner = Arc::clone(&self.inner);
                let id = device.clone();
                let handle = runtime.spawn(async move {
                    let outcome = runner.run().await;
                    inner.finish_device(run_id, &id);
                    outcome
                });
                (device, handle)
            })
            .collect();

        runtime.spawn(Inner::aggregate(
            Arc::clone(&self.inner),
            run_id,
            cancel,
            runners,
        ));

        Ok(())
    }

    /// Request a stop of the current run. No-op unless `Running`.
    pub fn stop_bot(&self) {
        let mut state = self.inner.lock_state();
        if state.status != RunStatus::Running {
            return;
        }

        if let Some(session) = &state.session {
            info!(run_id = session.run_id, "stop requested");
            session.cancel.cancel();
        }
        self.inner.events.run_info("stopping bot...");
        self.inner.transition(&mut state, RunStatus::Idle);
    }

    pub fn get_status(&self) -> RunStatus {
        self.inner.lock_state().status
    }

    pub fn subscribe_logs(&self) -> broadcast::Receiver<LogEntry> {
        self.inner.events.subscribe_logs()
    }

    pub fn subscribe_status(&self) -> broadcast::Receiver<RunStatus> {
        self.inner.events.subscribe_status()
    }

    /// Devices of the current run whose sequence has not terminated yet.
    pub fn active_devices(&self) -> Vec<DeviceId> {
        self.inner
            .lock_state()
            .session
            .as_ref()
            .map(RunSession::pending)
            .unwrap_or_default()
    }

    /// Resolve once every started run has drained (all runners terminal and
    /// bookkeeping released). Returns immediately when nothing is in flight.
    pub async fn wait_drained(&self) {
        let mut rx = self.inner.in_flight.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set and publish a new status. Publishing happens under the state lock
    /// so subscribers observe transitions in the order they were made.
    fn transition(&self, state: &mut ControllerState, next: RunStatus) {
        if state.status == next {
            return;
        }
        info!(from = %state.status, to = %next, "status transition");
        state.status = next;
        self.events.publish_status(next);
    }

    fn finish_device(&self, run_id: u64, device: &DeviceId) {
        let mut state = self.lock_state();
        if let Some(session) = state.session.as_mut().filter(|s| s.run_id == run_id) {
            session.finish(device);
        }
    }

    async fn aggregate(
        inner: Arc<Inner>,
        run_id: u64,
        cancel: CancellationToken,
        runners: Vec<(DeviceId, JoinHandle<DeviceOutcome>)>,
    ) {
        let _release = SessionRelease {
            inner: Arc::clone(&inner),
            run_id,
        };

        let total = runners.len();
        let mut failed = 0usize;

        for (device, handle) in runners {
            match handle.await {
                Ok(outcome) => {
                    debug!(run_id, %device, ?outcome, "runner finished");
                    if outcome.is_failed() {
                        failed += 1;
                    }
                }
                Err(e) => {
                    warn!(run_id, %device, error = %e, "runner task did not complete");
                    inner.events.device(device).error(format!("failed: runner aborted: {e}"));
                    failed += 1;
                }
            }
        }

        inner.settle(run_id, &cancel, failed, total);
    }

    /// Final status for a drained run. A run that is no longer the current
    /// one (a newer run started after a stop) never touches the status.
    fn settle(&self, run_id: u64, cancel: &CancellationToken, failed: usize, total: usize) {
        let mut state = self.lock_state();
        let current = state.session.as_ref().is_some_and(|s| s.run_id == run_id);

        if cancel.is_cancelled() {
            if current {
                self.transition(&mut state, RunStatus::Idle);
            }
            self.events.run_info("bot stopped");
        } else if failed > 0 {
            if current {
                self.transition(&mut state, RunStatus::Error);
            }
            self.events
                .run_error(format!("bot error: {failed} of {total} device(s) failed"));
        } else {
            if current {
                self.transition(&mut state, RunStatus::Completed);
            }
            self.events.run_info("bot completed successfully");
        }

        info!(run_id, failed, total, cancelled = cancel.is_cancelled(), "run drained");
        if current {
            state.session = None;
        }
    }
}

/// Releases a run's bookkeeping on every exit path of the aggregation task.
struct SessionRelease {
    inner: Arc<Inner>,
    run_id: u64,
}

impl Drop for SessionRelease {
    fn drop(&mut self) {
        {
            let mut state = self.inner.lock_state();
            if state.session.as_ref().is_some_and(|s| s.run_id == self.run_id) {
                state.session = None;
            }
        }
        self.inner.in_flight.send_modify(|n| *n = n.saturating_sub(1));
    }
}
