// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `phonefarm`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "phonefarm",
    version,
    about = "Wake, reset and drive a target app on every attached Android device.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Phonefarm.toml` in the current working directory if it
    /// exists, otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the adb executable (overrides `[adb].path` and `PHONEFARM_ADB`).
    #[arg(long, value_name = "PATH")]
    pub adb: Option<String>,

    /// Run only on this device serial. May be repeated.
    ///
    /// If omitted, every device reported by `adb devices` is used.
    #[arg(long = "device", short = 'd', value_name = "SERIAL")]
    pub devices: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PHONEFARM_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print events as JSON lines instead of text.
    #[arg(long)]
    pub json: bool,

    /// Print the attached devices and exit.
    #[arg(long, conflicts_with_all = ["check_adb", "dry_run"])]
    pub list_devices: bool,

    /// Check that adb can be executed and exit.
    #[arg(long, conflicts_with = "dry_run")]
    pub check_adb: bool,

    /// Resolve devices and print the plan, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
