use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use phonefarm::errors::ExecutionError;
use phonefarm::exec::{DeviceCommandExecutor, ExecFuture};
use phonefarm::sequence::CommandSet;
use phonefarm::types::DeviceId;
use tokio::sync::Notify;

/// Which command of the sequence a call was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Wake,
    Home,
    Launch,
    FocusProbe,
    ProcessProbe,
    Navigate,
    Other,
}

/// What the fallback (process existence) probe answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Non-empty pid.
    Alive,
    /// Succeeds with empty output.
    Empty,
    /// Fails like `pidof` does when nothing matches.
    Fails,
}

/// Scripted behaviour of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceScript {
    /// 1-based foreground probe attempt from which the marker shows up.
    /// `None` means the marker is never seen.
    pub ready_on: Option<u32>,
    pub fallback: Fallback,
    /// Every call of this kind fails.
    pub fail_on: Option<CommandKind>,
}

impl DeviceScript {
    pub fn ready_on(attempt: u32) -> Self {
        Self {
            ready_on: Some(attempt),
            ..Self::default()
        }
    }

    pub fn never_ready(fallback: Fallback) -> Self {
        Self {
            ready_on: None,
            fallback,
            fail_on: None,
        }
    }

    pub fn failing_on(kind: CommandKind) -> Self {
        Self {
            fail_on: Some(kind),
            ..Self::default()
        }
    }
}

impl Default for DeviceScript {
    fn default() -> Self {
        Self {
            ready_on: Some(1),
            fallback: Fallback::Alive,
            fail_on: None,
        }
    }
}

/// One recorded `execute` call.
#[derive(Debug, Clone)]
struct Call {
    device: DeviceId,
    kind: CommandKind,
}

/// A fake executor that:
/// - records every command it receives, per device
/// - answers probes according to a per-device [`DeviceScript`]
/// - can hold a command in flight until the test releases it
pub struct ScriptedExecutor {
    commands: CommandSet,
    default_script: DeviceScript,
    scripts: HashMap<DeviceId, DeviceScript>,
    latency: Duration,
    calls: Mutex<Vec<Call>>,
    focus_attempts: Mutex<HashMap<DeviceId, u32>>,
    holds: Mutex<HashMap<(DeviceId, CommandKind), Arc<Notify>>>,
}

impl ScriptedExecutor {
    /// `commands` must be the command set of the plan under test, so calls
    /// can be classified.
    pub fn new(commands: CommandSet) -> Self {
        Self {
            commands,
            default_script: DeviceScript::default(),
            scripts: HashMap::new(),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            focus_attempts: Mutex::new(HashMap::new()),
            holds: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_default(mut self, script: DeviceScript) -> Self {
        self.default_script = script;
        self
    }

    pub fn script(mut self, device: &str, script: DeviceScript) -> Self {
        self.scripts.insert(DeviceId::from(device), script);
        self
    }

    /// Every call takes this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The next call of `kind` on `device` blocks until the returned
    /// `Notify` is signalled (a permit given before the call also works).
    pub fn hold(&self, device: &str, kind: CommandKind) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap()
            .insert((DeviceId::from(device), kind), Arc::clone(&notify));
        notify
    }

    pub fn kinds_for(&self, device: &str) -> Vec<CommandKind> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.device.as_str() == device)
            .map(|c| c.kind)
            .collect()
    }

    pub fn count(&self, device: &str, kind: CommandKind) -> usize {
        self.kinds_for(device).into_iter().filter(|k| *k == kind).count()
    }

    /// Wait until `device` has received at least one call of `kind`.
    pub async fn wait_for_call(&self, device: &str, kind: CommandKind) {
        while self.count(device, kind) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    pub fn classify(&self, command: &str) -> CommandKind {
        let c = &self.commands;
        if command == c.wake() {
            CommandKind::Wake
        } else if command == c.home() {
            CommandKind::Home
        } else if command == c.launch() {
            CommandKind::Launch
        } else if command == c.focus_probe() {
            CommandKind::FocusProbe
        } else if command == c.process_probe() {
            CommandKind::ProcessProbe
        } else if command == c.navigate() {
            CommandKind::Navigate
        } else {
            CommandKind::Other
        }
    }

    fn script_for(&self, device: &DeviceId) -> DeviceScript {
        self.scripts
            .get(device)
            .copied()
            .unwrap_or(self.default_script)
    }

    fn answer(
        &self,
        device: &DeviceId,
        kind: CommandKind,
        script: DeviceScript,
    ) -> Result<String, ExecutionError> {
        if script.fail_on == Some(kind) {
            return Err(ExecutionError::Failed(format!("scripted failure on {kind:?}")));
        }

        match kind {
            CommandKind::FocusProbe => {
                let attempt = {
                    let mut attempts = self.focus_attempts.lock().unwrap();
                    let n = attempts.entry(device.clone()).or_insert(0);
                    *n += 1;
                    *n
                };
                match script.ready_on {
                    Some(k) if attempt >= k => Ok(format!(
                        "mCurrentFocus=Window{{42 u0 com.target.{}/.MainActivity}}",
                        self.commands.marker()
                    )),
                    _ => Ok("mCurrentFocus=Window{7 u0 com.android.launcher3/.Launcher}".to_string()),
                }
            }
            CommandKind::ProcessProbe => match script.fallback {
                Fallback::Alive => Ok("4242".to_string()),
                Fallback::Empty => Ok(String::new()),
                Fallback::Fails => Err(ExecutionError::NonZeroExit {
                    code: 1,
                    stderr: String::new(),
                }),
            },
            _ => Ok(String::new()),
        }
    }
}

impl DeviceCommandExecutor for ScriptedExecutor {
    fn execute<'a>(&'a self, device: &'a DeviceId, command: &'a str) -> ExecFuture<'a> {
        Box::pin(async move {
            let kind = self.classify(command);
            self.calls.lock().unwrap().push(Call {
                device: device.clone(),
                kind,
            });

            let hold = self.holds.lock().unwrap().remove(&(device.clone(), kind));
            if let Some(notify) = hold {
                notify.notified().await;
            }

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            self.answer(device, kind, self.script_for(device))
        })
    }
}
