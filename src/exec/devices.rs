// src/exec/devices.rs

//! Parsing of `adb devices` output.

use crate::types::DeviceId;

/// Extract the serials of all devices in the `device` state.
///
/// Accepts both the plain (`<serial>\tdevice`) and the long
/// (`<serial>   device product:...`) formats. Header lines, blank lines and
/// devices that are `offline`, `unauthorized`, etc. are skipped.
pub fn parse_devices(output: &str) -> Vec<DeviceId> {
    let mut devices: Vec<DeviceId> = Vec::new();

    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (Some(serial), Some(state)) = (parts.next(), parts.next()) else {
            continue;
        };

        if state != "device" {
            continue;
        }

        let id = DeviceId::from(serial);
        if !devices.contains(&id) {
            devices.push(id);
        }
    }

    devices
}
