// src/engine/session.rs

//! Bookkeeping for one run.

use std::collections::BTreeSet;

use tokio_util::sync::CancellationToken;

use crate::types::DeviceId;

/// One invocation of "start bot for devices D".
///
/// Owned exclusively by the controller. Runners only receive clones of
/// `cancel` and never reset it; a new run always gets a fresh token.
#[derive(Debug)]
pub(crate) struct RunSession {
    pub(crate) run_id: u64,
    pub(crate) cancel: CancellationToken,
    /// Devices whose runner has not reached a terminal state yet.
    pending: BTreeSet<DeviceId>,
}

impl RunSession {
    pub(crate) fn new(run_id: u64, devices: &[DeviceId]) -> Self {
        Self {
            run_id,
            cancel: CancellationToken::new(),
            pending: devices.iter().cloned().collect(),
        }
    }

    pub(crate) fn finish(&mut self, device: &DeviceId) {
        self.pending.remove(device);
    }

    pub(crate) fn pending(&self) -> Vec<DeviceId> {
        self.pending.iter().cloned().collect()
    }
}

/// Order-preserving dedupe of the caller's device list.
pub(crate) fn unique_devices(devices: impl IntoIterator<Item = DeviceId>) -> Vec<DeviceId> {
    let mut seen = BTreeSet::new();
    devices
        .into_iter()
        .filter(|d| seen.insert(d.clone()))
        .collect()
}
