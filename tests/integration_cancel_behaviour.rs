mod common;

use std::time::Duration;

use phonefarm::types::RunStatus;
use phonefarm_test_utils::builders::PlanBuilder;
use phonefarm_test_utils::fake_executor::{CommandKind, DeviceScript};
use phonefarm_test_utils::{drain_logs, drain_status, messages_for, run_messages, with_timeout};

use crate::common::{TestResult, controller_with, devices, init_tracing, wait_until};

#[tokio::test(start_paused = true)]
async fn stop_lets_the_in_flight_command_finish() -> TestResult {
    init_tracing();
    let (controller, exec) = controller_with(PlanBuilder::instant().build(), |e| e);
    let release = exec.hold("A", CommandKind::Launch);
    let mut logs = controller.subscribe_logs();
    let mut status = controller.subscribe_status();

    controller.start_bot(devices(&["A"]))?;
    with_timeout(exec.wait_for_call("A", CommandKind::Launch)).await;

    controller.stop_bot();
    assert_eq!(controller.get_status(), RunStatus::Idle);
    // The runner is still blocked inside the launch command.
    assert_eq!(controller.active_devices(), devices(&["A"]));

    release.notify_one();
    with_timeout(controller.wait_drained()).await;

    assert_eq!(
        exec.kinds_for("A"),
        vec![CommandKind::Wake, CommandKind::Home, CommandKind::Launch]
    );
    assert_eq!(controller.get_status(), RunStatus::Idle);
    assert_eq!(drain_status(&mut status), vec![RunStatus::Running, RunStatus::Idle]);

    let entries = drain_logs(&mut logs);
    assert_eq!(messages_for(&entries, "A"), vec!["bot start", "stopped by request"]);
    assert_eq!(
        run_messages(&entries),
        vec!["starting bot for 1 device(s)", "stopping bot...", "bot stopped"]
    );
    assert!(controller.active_devices().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn repeated_stop_is_idempotent() -> TestResult {
    init_tracing();
    let (controller, exec) = controller_with(PlanBuilder::instant().build(), |e| e);
    let release = exec.hold("A", CommandKind::Home);
    let mut logs = controller.subscribe_logs();
    let mut status = controller.subscribe_status();

    controller.start_bot(devices(&["A"]))?;
    with_timeout(exec.wait_for_call("A", CommandKind::Home)).await;

    controller.stop_bot();
    controller.stop_bot();
    controller.stop_bot();

    release.notify_one();
    with_timeout(controller.wait_drained()).await;

    assert_eq!(drain_status(&mut status), vec![RunStatus::Running, RunStatus::Idle]);
    let entries = drain_logs(&mut logs);
    let stops = run_messages(&entries)
        .into_iter()
        .filter(|m| m == "stopping bot...")
        .count();
    assert_eq!(stops, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_wins_over_a_failed_device() -> TestResult {
    init_tracing();
    let (controller, exec) = controller_with(PlanBuilder::instant().build(), |e| {
        e.script("A", DeviceScript::failing_on(CommandKind::Launch))
    });
    let release = exec.hold("B", CommandKind::Launch);
    let mut logs = controller.subscribe_logs();

    controller.start_bot(devices(&["A", "B"]))?;
    with_timeout(wait_until(|| controller.active_devices() == devices(&["B"]))).await;

    controller.stop_bot();
    release.notify_one();
    with_timeout(controller.wait_drained()).await;

    assert_eq!(controller.get_status(), RunStatus::Idle);
    let entries = drain_logs(&mut logs);
    assert_eq!(
        messages_for(&entries, "A").last().map(String::as_str),
        Some("failed: launch target failed: scripted failure on Launch")
    );
    assert_eq!(
        messages_for(&entries, "B").last().map(String::as_str),
        Some("stopped by request")
    );
    assert_eq!(run_messages(&entries).last().map(String::as_str), Some("bot stopped"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stopped_run_draining_late_does_not_touch_the_next_run() -> TestResult {
    init_tracing();
    let (controller, exec) = controller_with(PlanBuilder::instant().build(), |e| e);
    let release = exec.hold("A", CommandKind::Launch);
    let mut logs = controller.subscribe_logs();
    let mut status = controller.subscribe_status();

    controller.start_bot(devices(&["A"]))?;
    with_timeout(exec.wait_for_call("A", CommandKind::Launch)).await;
    controller.stop_bot();

    // A new run may start while the stopped one is still draining.
    controller.start_bot(devices(&["B"]))?;
    assert_eq!(controller.active_devices(), devices(&["B"]));
    with_timeout(wait_until(|| controller.get_status() == RunStatus::Completed)).await;

    release.notify_one();
    with_timeout(controller.wait_drained()).await;

    assert_eq!(controller.get_status(), RunStatus::Completed);
    assert_eq!(
        drain_status(&mut status),
        vec![
            RunStatus::Running,
            RunStatus::Idle,
            RunStatus::Running,
            RunStatus::Completed,
        ]
    );

    // The stopped run saw its own token, not the fresh one.
    assert_eq!(exec.count("A", CommandKind::FocusProbe), 0);
    assert_eq!(exec.count("B", CommandKind::Navigate), 1);
    let entries = drain_logs(&mut logs);
    assert_eq!(
        messages_for(&entries, "A").last().map(String::as_str),
        Some("stopped by request")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn restart_on_the_same_device_keeps_runs_apart() -> TestResult {
    init_tracing();
    let (controller, exec) = controller_with(PlanBuilder::instant().build(), |e| e);
    let release = exec.hold("A", CommandKind::Wake);

    controller.start_bot(devices(&["A"]))?;
    with_timeout(exec.wait_for_call("A", CommandKind::Wake)).await;
    controller.stop_bot();

    // The second run drives A while the stopped run's wake is still in flight.
    controller.start_bot(devices(&["A"]))?;
    with_timeout(wait_until(|| controller.get_status() == RunStatus::Completed)).await;
    assert_eq!(exec.count("A", CommandKind::Navigate), 1);

    release.notify_one();
    with_timeout(controller.wait_drained()).await;

    // Once its wake returns, the stopped run issues nothing more.
    assert_eq!(controller.get_status(), RunStatus::Completed);
    assert_eq!(exec.count("A", CommandKind::Wake), 2);
    assert_eq!(exec.count("A", CommandKind::Home), 1);
    assert_eq!(exec.count("A", CommandKind::Navigate), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_during_polling_skips_navigation() -> TestResult {
    init_tracing();
    let plan = PlanBuilder::instant()
        .ready_interval(Duration::from_millis(700))
        .build();
    let (controller, exec) = controller_with(plan, |e| e.with_default(DeviceScript::ready_on(3)));
    let mut logs = controller.subscribe_logs();

    controller.start_bot(devices(&["A"]))?;
    with_timeout(exec.wait_for_call("A", CommandKind::FocusProbe)).await;
    controller.stop_bot();
    with_timeout(controller.wait_drained()).await;

    // Polling is not interrupted; the stop is seen before navigation.
    assert_eq!(exec.count("A", CommandKind::FocusProbe), 3);
    assert_eq!(exec.count("A", CommandKind::Navigate), 0);
    assert_eq!(
        messages_for(&drain_logs(&mut logs), "A"),
        vec!["bot start", "target active (attempt 3)", "stopped by request"]
    );
    assert_eq!(controller.get_status(), RunStatus::Idle);
    Ok(())
}
