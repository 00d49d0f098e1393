// src/engine/mod.rs

//! Orchestration engine for phonefarm.
//!
//! This module ties together:
//! - the run controller (aggregate status, start/stop, per-run sessions)
//! - the event hub that fans log entries and status transitions out to
//!   any number of subscribers
//!
//! The per-device step machine itself lives in [`crate::sequence`].

pub mod controller;
pub mod events;
mod session;

pub use controller::BotController;
pub use events::{DEFAULT_EVENT_CAPACITY, DeviceLogger, EventHub};
