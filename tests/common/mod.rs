#![allow(dead_code)]

use std::sync::Arc;

use phonefarm::engine::BotController;
use phonefarm::sequence::SequencePlan;
use phonefarm::types::DeviceId;
use phonefarm_test_utils::fake_executor::ScriptedExecutor;

pub use phonefarm_test_utils::init_tracing;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const NAVIGATED: &str = "navigated to https://www.youtube.com/@MuseIndonesia";

pub fn devices(ids: &[&str]) -> Vec<DeviceId> {
    ids.iter().map(|id| DeviceId::from(*id)).collect()
}

/// Wire a controller to a scripted executor built for `plan`'s commands.
pub fn controller_with(
    plan: SequencePlan,
    configure: impl FnOnce(ScriptedExecutor) -> ScriptedExecutor,
) -> (BotController, Arc<ScriptedExecutor>) {
    let exec = Arc::new(configure(ScriptedExecutor::new(plan.commands.clone())));
    let controller = BotController::new(exec.clone(), plan);
    (controller, exec)
}

/// Poll `cond` every millisecond of (possibly paused) tokio time.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    while !cond() {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
}
