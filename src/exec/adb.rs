// src/exec/adb.rs

//! ADB-backed command executor.
//!
//! Every command runs as `"<adb>" -s <device> <command>` through the platform
//! shell, so host-side pipes in a command (`... | grep ...`) behave the same
//! way they do when typed into a terminal.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::config::AdbSection;
use crate::errors::ExecutionError;
use crate::exec::backend::{DeviceCommandExecutor, ExecFuture};
use crate::exec::devices::parse_devices;
use crate::types::DeviceId;

/// Environment variable consulted when neither the CLI nor the config names
/// an adb executable.
pub const ADB_ENV_VAR: &str = "PHONEFARM_ADB";

const VALIDATE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AdbExecutor {
    program: String,
    timeout: Option<Duration>,
}

impl AdbExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the adb executable: CLI flag, then `[adb].path`, then
    /// `PHONEFARM_ADB`, then plain `adb` on `PATH`.
    pub fn resolve(cli_path: Option<&str>, section: &AdbSection) -> Self {
        let program = cli_path
            .map(str::to_string)
            .or_else(|| section.path.clone())
            .or_else(|| std::env::var(ADB_ENV_VAR).ok().filter(|p| !p.trim().is_empty()))
            .unwrap_or_else(|| "adb".to_string());

        debug!(%program, "resolved adb executable");
        Self::new(program).with_timeout(section.command_timeout())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// List devices currently attached and in the `device` state.
    pub async fn list_devices(&self) -> std::result::Result<Vec<DeviceId>, ExecutionError> {
        let line = format!("\"{}\" devices", self.program);
        let out = run_shell_line(&line, self.timeout).await?;
        let devices = parse_devices(&out);
        debug!(count = devices.len(), ?devices, "parsed adb device list");
        Ok(devices)
    }

    /// Check that the adb executable can be invoked at all.
    pub async fn validate(&self) -> bool {
        let line = format!("\"{}\" version", self.program);
        match run_shell_line(&line, Some(VALIDATE_TIMEOUT)).await {
            Ok(version) => {
                debug!(%version, "adb available");
                true
            }
            Err(e) => {
                warn!(program = %self.program, error = %e, "adb not available");
                false
            }
        }
    }
}

impl DeviceCommandExecutor for AdbExecutor {
    fn execute<'a>(&'a self, device: &'a DeviceId, command: &'a str) -> ExecFuture<'a> {
        Box::pin(async move {
            check_device_id(device)?;
            let line = format!("\"{}\" -s {} {}", self.program, device, command);
            run_shell_line(&line, self.timeout).await
        })
    }
}

/// Serials are interpolated into a shell line, so reject anything that could
/// change its meaning.
fn check_device_id(device: &DeviceId) -> std::result::Result<(), ExecutionError> {
    let id = device.as_str();
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));

    if valid {
        Ok(())
    } else {
        Err(ExecutionError::Failed(format!("invalid device id '{id}'")))
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(line: &str) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

async fn run_shell_line(
    line: &str,
    timeout: Option<Duration>,
) -> std::result::Result<String, ExecutionError> {
    trace!(%line, "spawn");

    let child = shell_command(line)
        .spawn()
        .map_err(|e| ExecutionError::Spawn(e.to_string()))?;

    // Dropping the future on timeout drops the child, which kills it.
    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| ExecutionError::Timeout(limit))??,
        None => child.wait_with_output().await?,
    };

    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
    }

    match output.status.code() {
        Some(code) => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(%line, code, %stderr, "command exited non-zero");
            Err(ExecutionError::NonZeroExit { code, stderr })
        }
        None => Err(ExecutionError::Terminated),
    }
}
