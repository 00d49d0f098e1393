// src/sequence/commands.rs

//! Opaque command strings issued to each device.
//!
//! The runner only pattern-matches the output of the two probes; everything
//! else is fire-and-forget payload for the executor.

use crate::config::TargetSection;

const WAKE: &str = "shell input keyevent 224";
const HOME: &str = "shell input keyevent 3";
const FOCUS_PROBE: &str = "shell dumpsys window | grep mCurrentFocus";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSet {
    marker: String,
    url: String,
    launch: String,
    process_probe: String,
    navigate: String,
}

impl CommandSet {
    pub fn new(package: &str, marker: &str, url: &str) -> Self {
        Self {
            marker: marker.to_string(),
            url: url.to_string(),
            launch: format!("shell monkey -p {package} 1"),
            process_probe: format!("shell pidof {package}"),
            navigate: format!(
                "shell am start -a android.intent.action.VIEW -d \"{url}\" -p {package}"
            ),
        }
    }

    pub fn for_target(target: &TargetSection) -> Self {
        Self::new(&target.package, &target.marker, &target.url)
    }

    /// Wake the screen (KEYCODE_WAKEUP; unlike POWER it never toggles off).
    pub fn wake(&self) -> &str {
        WAKE
    }

    pub fn home(&self) -> &str {
        HOME
    }

    pub fn launch(&self) -> &str {
        &self.launch
    }

    pub fn focus_probe(&self) -> &str {
        FOCUS_PROBE
    }

    pub fn process_probe(&self) -> &str {
        &self.process_probe
    }

    pub fn navigate(&self) -> &str {
        &self.navigate
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// All commands with a short label, in issue order. Used by `--dry-run`.
    pub fn labelled(&self) -> [(&'static str, &str); 6] {
        [
            ("wake", self.wake()),
            ("home", self.home()),
            ("launch", self.launch()),
            ("focus probe", self.focus_probe()),
            ("fallback probe", self.process_probe()),
            ("navigate", self.navigate()),
        ]
    }
}

impl Default for CommandSet {
    fn default() -> Self {
        Self::for_target(&TargetSection::default())
    }
}
