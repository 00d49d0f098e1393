// src/exec/backend.rs

//! Pluggable command executor abstraction.
//!
//! The sequence runner talks to a `DeviceCommandExecutor` instead of spawning
//! processes itself. Production uses [`AdbExecutor`](super::AdbExecutor);
//! tests provide scripted implementations that never touch a real device.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::ExecutionError;
use crate::types::DeviceId;

/// Future returned by [`DeviceCommandExecutor::execute`].
pub type ExecFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<String, ExecutionError>> + Send + 'a>>;

/// Runs one opaque command string against one device.
///
/// Implementations must be safe to call concurrently for *different*
/// devices. For a single device the runner never issues two commands at the
/// same time, so implementations may assume in-order, non-overlapping calls
/// per device.
pub trait DeviceCommandExecutor: Send + Sync {
    /// Execute `command` on `device` and return its captured output.
    fn execute<'a>(&'a self, device: &'a DeviceId, command: &'a str) -> ExecFuture<'a>;
}

impl<T: DeviceCommandExecutor + ?Sized> DeviceCommandExecutor for Arc<T> {
    fn execute<'a>(&'a self, device: &'a DeviceId, command: &'a str) -> ExecFuture<'a> {
        (**self).execute(device, command)
    }
}
