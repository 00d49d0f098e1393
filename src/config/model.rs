// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [adb]
/// path = "adb"
///
/// [target]
/// package = "com.google.android.youtube"
/// marker = "youtube"
/// url = "https://www.youtube.com/@MuseIndonesia"
///
/// [sequence]
/// settle_ms = 500
/// post_navigate_ms = 1500
/// ready_attempts = 5
/// ready_interval_ms = 700
///
/// [events]
/// capacity = 256
/// ```
///
/// All sections are optional and default to the values shown above.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub adb: AdbSection,

    #[serde(default)]
    pub target: TargetSection,

    #[serde(default)]
    pub sequence: SequenceSection,

    #[serde(default)]
    pub events: EventsSection,
}

/// Validated configuration. Only constructed through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub adb: AdbSection,
    pub target: TargetSection,
    pub sequence: SequenceSection,
    pub events: EventsSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            adb: raw.adb,
            target: raw.target,
            sequence: raw.sequence,
            events: raw.events,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[adb]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdbSection {
    /// Path to the adb executable. If `None`, `PHONEFARM_ADB` or plain
    /// `adb` on `PATH` is used.
    #[serde(default)]
    pub path: Option<String>,

    /// Upper bound for a single device command. Unbounded when absent.
    #[serde(default)]
    pub command_timeout_ms: Option<u64>,
}

impl AdbSection {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }
}

/// `[target]` section: the application the bot brings up on every device.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSection {
    #[serde(default = "default_package")]
    pub package: String,

    /// Case-insensitive substring expected in the foreground window probe.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Deep link opened inside the target application.
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_package() -> String {
    "com.google.android.youtube".to_string()
}

fn default_marker() -> String {
    "youtube".to_string()
}

fn default_url() -> String {
    "https://www.youtube.com/@MuseIndonesia".to_string()
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            package: default_package(),
            marker: default_marker(),
            url: default_url(),
        }
    }
}

/// `[sequence]` section: fixed delays and the readiness poll budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceSection {
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_post_navigate_ms")]
    pub post_navigate_ms: u64,

    #[serde(default = "default_ready_attempts")]
    pub ready_attempts: u32,

    #[serde(default = "default_ready_interval_ms")]
    pub ready_interval_ms: u64,
}

fn default_settle_ms() -> u64 {
    500
}

fn default_post_navigate_ms() -> u64 {
    1500
}

fn default_ready_attempts() -> u32 {
    5
}

fn default_ready_interval_ms() -> u64 {
    700
}

impl Default for SequenceSection {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            post_navigate_ms: default_post_navigate_ms(),
            ready_attempts: default_ready_attempts(),
            ready_interval_ms: default_ready_interval_ms(),
        }
    }
}

/// `[events]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsSection {
    /// Capacity of each broadcast stream (logs, status). Slow subscribers
    /// that fall further behind than this lose the oldest entries.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    256
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}
