// src/exec/mod.rs

//! Device command execution layer.
//!
//! - [`backend`] defines the `DeviceCommandExecutor` trait the sequence
//!   runner is written against.
//! - [`adb`] is the production implementation that shells out to `adb`.
//! - [`devices`] parses `adb devices` output for discovery.

pub mod adb;
pub mod backend;
pub mod devices;

pub use adb::AdbExecutor;
pub use backend::{DeviceCommandExecutor, ExecFuture};
pub use devices::parse_devices;
