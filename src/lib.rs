// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod sequence;
pub mod sink;
pub mod types;

use std::sync::Arc;

use anyhow::{Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::engine::BotController;
use crate::exec::AdbExecutor;
use crate::sequence::SequencePlan;
use crate::sink::OutputFormat;
use crate::types::{DeviceId, RunStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - adb executor + device discovery
/// - the bot controller and its event sink
/// - Ctrl-C handling (mapped to `stop_bot`)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let adb = AdbExecutor::resolve(args.adb.as_deref(), &cfg.adb);

    if args.check_adb {
        let available = adb.validate().await;
        println!(
            "adb ({}): {}",
            adb.program(),
            if available { "available" } else { "not available" }
        );
        if !available {
            bail!("adb executable '{}' could not be run", adb.program());
        }
        return Ok(());
    }

    if args.list_devices {
        for device in adb.list_devices().await? {
            println!("{device}");
        }
        return Ok(());
    }

    let devices = resolve_devices(&args, &adb).await?;

    if args.dry_run {
        print_dry_run(&devices, &SequencePlan::from_config(&cfg), &cfg);
        return Ok(());
    }

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let controller = BotController::from_config(Arc::new(adb), &cfg);

    let printer_shutdown = CancellationToken::new();
    let printer = sink::spawn_printer(
        controller.subscribe_logs(),
        controller.subscribe_status(),
        format,
        printer_shutdown.clone(),
    );

    // Ctrl-C → best-effort stop; runners exit at their next step boundary.
    {
        let controller = controller.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; stopping bot");
            controller.stop_bot();
        });
    }

    controller.start_bot(devices)?;
    controller.wait_drained().await;
    let status = controller.get_status();

    printer_shutdown.cancel();
    let _ = printer.await;

    info!(%status, "run finished");
    if status == RunStatus::Error {
        bail!("one or more devices failed");
    }
    Ok(())
}

/// Explicit `--device` flags win; otherwise ask adb.
async fn resolve_devices(args: &CliArgs, adb: &AdbExecutor) -> Result<Vec<DeviceId>> {
    if !args.devices.is_empty() {
        return Ok(args.devices.iter().cloned().map(DeviceId::from).collect());
    }

    let devices = adb.list_devices().await?;
    info!(?devices, "discovered devices");
    Ok(devices)
}

fn print_dry_run(devices: &[DeviceId], plan: &SequencePlan, cfg: &ConfigFile) {
    println!("phonefarm dry-run");
    println!("  adb.command_timeout = {:?}", cfg.adb.command_timeout());
    println!("  sequence.settle = {:?}", plan.settle);
    println!("  sequence.post_navigate = {:?}", plan.post_navigate);
    println!(
        "  sequence.readiness = {} attempt(s) every {:?}",
        plan.readiness.attempts, plan.readiness.interval
    );
    println!("  target.marker = {}", plan.commands.marker());
    println!();

    println!("commands:");
    for (label, command) in plan.commands.labelled() {
        println!("  {label:<15} {command}");
    }
    println!();

    println!("devices ({}):", devices.len());
    for device in devices {
        println!("  - {device}");
    }

    debug!("dry-run complete (no execution)");
}
