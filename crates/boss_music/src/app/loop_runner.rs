use std::process::ExitCode;

use engine::run_client_with_metrics;
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    let summary = match run_client_with_metrics(&app.loop_config, &mut app.client, &app.metrics) {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let metrics = app.metrics.snapshot();
    let controller = app.controller.borrow();
    info!(
        ticks_run = summary.ticks_run,
        dropped_backlog_ms = summary.dropped_backlog.as_millis() as u64,
        tps = metrics.tps,
        boss = controller.current_boss().map(|boss| boss.name()),
        bridge = ?controller.bridge_status(),
        "scenario_finished"
    );
    ExitCode::SUCCESS
}
