mod common;

use std::time::Duration;

use phonefarm::errors::SequenceError;
use phonefarm::sequence::{Readiness, ReadinessPolicy, await_ready};
use phonefarm::types::{DeviceId, RunStatus};
use phonefarm_test_utils::builders::PlanBuilder;
use phonefarm_test_utils::fake_executor::{CommandKind, DeviceScript, Fallback, ScriptedExecutor};
use phonefarm_test_utils::{drain_logs, messages_for, with_timeout};
use tokio::time::Instant;

use crate::common::{NAVIGATED, TestResult, controller_with, devices, init_tracing};

fn executor(script: DeviceScript) -> ScriptedExecutor {
    ScriptedExecutor::new(PlanBuilder::new().build().commands).with_default(script)
}

fn assert_elapsed(started: Instant, millis: u64) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_millis(millis) && elapsed < Duration::from_millis(millis + 50),
        "elapsed {elapsed:?}, expected ~{millis}ms"
    );
}

#[tokio::test(start_paused = true)]
async fn marker_on_third_probe() {
    init_tracing();
    let exec = executor(DeviceScript::ready_on(3));
    let plan = PlanBuilder::new().build();
    let device = DeviceId::from("A");

    let started = Instant::now();
    let readiness = await_ready(&exec, &device, &plan.commands, &plan.readiness)
        .await
        .unwrap();

    assert_eq!(readiness, Readiness::Foreground { attempt: 3 });
    assert_eq!(exec.count("A", CommandKind::FocusProbe), 3);
    assert_eq!(exec.count("A", CommandKind::ProcessProbe), 0);
    assert_elapsed(started, 1400);
}

#[tokio::test(start_paused = true)]
async fn fallback_alive_counts_as_ready() {
    init_tracing();
    let exec = executor(DeviceScript::never_ready(Fallback::Alive));
    let plan = PlanBuilder::new().build();
    let device = DeviceId::from("A");

    let started = Instant::now();
    let readiness = await_ready(&exec, &device, &plan.commands, &plan.readiness)
        .await
        .unwrap();

    assert_eq!(readiness, Readiness::ProcessAlive);
    assert_eq!(exec.count("A", CommandKind::FocusProbe), 5);
    assert_eq!(exec.count("A", CommandKind::ProcessProbe), 1);
    // The poll also waits after the last miss.
    assert_elapsed(started, 3500);
}

#[tokio::test(start_paused = true)]
async fn fallback_empty_or_failing_is_a_timeout() {
    init_tracing();
    let plan = PlanBuilder::instant().build();
    let device = DeviceId::from("A");

    for fallback in [Fallback::Empty, Fallback::Fails] {
        let exec = executor(DeviceScript::never_ready(fallback));
        let err = await_ready(&exec, &device, &plan.commands, &plan.readiness)
            .await
            .unwrap_err();
        assert_eq!(err, SequenceError::ReadinessTimeout { attempts: 5 }, "{fallback:?}");
        assert_eq!(exec.count("A", CommandKind::ProcessProbe), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn failing_probes_count_as_misses() {
    init_tracing();
    let exec = executor(DeviceScript::failing_on(CommandKind::FocusProbe));
    let plan = PlanBuilder::instant().build();
    let device = DeviceId::from("A");

    let readiness = await_ready(&exec, &device, &plan.commands, &plan.readiness)
        .await
        .unwrap();

    assert_eq!(readiness, Readiness::ProcessAlive);
    assert_eq!(exec.count("A", CommandKind::FocusProbe), 5);
}

#[tokio::test(start_paused = true)]
async fn custom_attempt_budget() {
    init_tracing();
    let exec = executor(DeviceScript::ready_on(3));
    let plan = PlanBuilder::instant().ready_attempts(2).build();
    let device = DeviceId::from("A");

    let readiness = await_ready(&exec, &device, &plan.commands, &plan.readiness)
        .await
        .unwrap();

    assert_eq!(readiness, Readiness::ProcessAlive);
    assert_eq!(exec.count("A", CommandKind::FocusProbe), 2);
}

#[tokio::test(start_paused = true)]
async fn custom_target_marker_is_recognised() {
    init_tracing();
    let plan = PlanBuilder::instant()
        .target("com.example.Player", "PLAYER", "https://example.com/watch")
        .build();
    let exec = ScriptedExecutor::new(plan.commands.clone());
    let device = DeviceId::from("A");

    let readiness = await_ready(&exec, &device, &plan.commands, &ReadinessPolicy::default())
        .await
        .unwrap();
    assert_eq!(readiness, Readiness::Foreground { attempt: 1 });
}

#[tokio::test(start_paused = true)]
async fn fallback_ready_device_still_navigates() -> TestResult {
    init_tracing();
    let (controller, exec) = controller_with(PlanBuilder::instant().build(), |e| {
        e.with_default(DeviceScript::never_ready(Fallback::Alive))
    });
    let mut logs = controller.subscribe_logs();

    controller.start_bot(devices(&["A"]))?;
    with_timeout(controller.wait_drained()).await;

    assert_eq!(controller.get_status(), RunStatus::Completed);
    assert_eq!(exec.count("A", CommandKind::Navigate), 1);
    assert_eq!(
        messages_for(&drain_logs(&mut logs), "A"),
        vec!["bot start", "target active (process alive)", NAVIGATED, "bot end"]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn readiness_timeout_fails_the_device() -> TestResult {
    init_tracing();
    let (controller, exec) = controller_with(PlanBuilder::instant().build(), |e| {
        e.with_default(DeviceScript::never_ready(Fallback::Empty))
    });
    let mut logs = controller.subscribe_logs();

    controller.start_bot(devices(&["A"]))?;
    with_timeout(controller.wait_drained()).await;

    assert_eq!(controller.get_status(), RunStatus::Error);
    assert_eq!(exec.count("A", CommandKind::Navigate), 0);
    assert_eq!(
        messages_for(&drain_logs(&mut logs), "A"),
        vec![
            "bot start",
            "failed: target failed to become ready after 5 attempt(s) and fallback check",
        ]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn wake_failure_stops_the_sequence() -> TestResult {
    init_tracing();
    let (controller, exec) = controller_with(PlanBuilder::instant().build(), |e| {
        e.with_default(DeviceScript::failing_on(CommandKind::Wake))
    });

    controller.start_bot(devices(&["A"]))?;
    with_timeout(controller.wait_drained()).await;

    assert_eq!(controller.get_status(), RunStatus::Error);
    assert_eq!(exec.kinds_for("A"), vec![CommandKind::Wake]);
    Ok(())
}
