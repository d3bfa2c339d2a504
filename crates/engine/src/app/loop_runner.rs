use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use super::client::Client;
use super::metrics::TickWindow;
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    /// Stop after this many ticks; `None` runs until the process is stopped.
    pub max_ticks: Option<u64>,
    pub realtime: bool,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 20,
            max_ticks: None,
            realtime: true,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("a headless run without real-time pacing needs a tick limit")]
    UnboundedHeadlessRun,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub dropped_backlog: Duration,
}

pub fn run_client(config: &LoopConfig, client: &mut Client) -> Result<RunSummary, AppError> {
    run_client_with_metrics(config, client, &MetricsHandle::default())
}

pub fn run_client_with_metrics(
    config: &LoopConfig,
    client: &mut Client,
    metrics: &MetricsHandle,
) -> Result<RunSummary, AppError> {
    if !config.realtime && config.max_ticks.is_none() {
        return Err(AppError::UnboundedHeadlessRun);
    }

    let mut clock = FixedStepClock::new(config);
    let metrics_interval = non_zero_or(config.metrics_log_interval, Duration::from_secs(1));
    info!(
        target_tps = config.target_tps.max(1),
        realtime = config.realtime,
        max_ticks = config.max_ticks,
        max_frame_delta_ms = clock.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = clock.max_ticks_per_frame,
        metrics_interval_ms = metrics_interval.as_millis() as u64,
        "loop_config"
    );

    let mut summary = RunSummary::default();
    let mut window = TickWindow::open(metrics_interval, client.sounds());
    let mut last_frame = Instant::now();

    while !limit_reached(config.max_ticks, summary.ticks_run) {
        let frame_start = Instant::now();
        let due = if config.realtime {
            let steps = clock.advance(frame_start.saturating_duration_since(last_frame));
            last_frame = frame_start;
            if !steps.dropped.is_zero() {
                summary.dropped_backlog = summary.dropped_backlog.saturating_add(steps.dropped);
                warn!(
                    dropped_backlog_ms = steps.dropped.as_millis() as u64,
                    max_ticks_per_frame = clock.max_ticks_per_frame,
                    "sim_clamp_triggered"
                );
            }
            steps.ticks
        } else {
            1
        };

        for _ in 0..due {
            if limit_reached(config.max_ticks, summary.ticks_run) {
                break;
            }
            let tick_start = Instant::now();
            client.run_tick();
            window.record_tick(tick_start.elapsed());
            summary.ticks_run = summary.ticks_run.saturating_add(1);
        }

        if let Some(snapshot) = window.close_if_elapsed(Instant::now(), client.sounds()) {
            metrics.publish(snapshot);
            info!(
                tps = snapshot.tps,
                avg_tick_ms = snapshot.avg_tick_ms,
                max_tick_ms = snapshot.max_tick_ms,
                playing_sounds = snapshot.playing_sounds,
                suppressed_sounds = snapshot.suppressed_sounds,
                tick = client.tick_count(),
                "loop_metrics"
            );
        }

        if config.realtime {
            let idle = clock.fixed_dt.saturating_sub(frame_start.elapsed());
            if !idle.is_zero() {
                thread::sleep(idle);
            }
        }
    }

    client.shutdown();
    info!(
        ticks_run = summary.ticks_run,
        dropped_backlog_ms = summary.dropped_backlog.as_millis() as u64,
        "loop_finished"
    );
    Ok(summary)
}

fn limit_reached(max_ticks: Option<u64>, ticks_run: u64) -> bool {
    max_ticks.is_some_and(|limit| ticks_run >= limit)
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Steps {
    ticks: u32,
    dropped: Duration,
}

#[derive(Debug)]
struct FixedStepClock {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    backlog: Duration,
}

impl FixedStepClock {
    fn new(config: &LoopConfig) -> Self {
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / f64::from(config.target_tps.max(1))),
            max_frame_delta: non_zero_or(config.max_frame_delta, Duration::from_millis(250)),
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            backlog: Duration::ZERO,
        }
    }

    fn advance(&mut self, frame_dt: Duration) -> Steps {
        self.backlog = self.backlog.saturating_add(frame_dt.min(self.max_frame_delta));

        let mut ticks = 0u32;
        while self.backlog >= self.fixed_dt && ticks < self.max_ticks_per_frame {
            self.backlog -= self.fixed_dt;
            ticks += 1;
        }

        let dropped = if self.backlog >= self.fixed_dt {
            std::mem::take(&mut self.backlog)
        } else {
            Duration::ZERO
        };
        Steps { ticks, dropped }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::app::client::{ClientContext, ClientHandler, TickEvent, TickPhase};

    struct EndTickCounter {
        count: Rc<Cell<u64>>,
    }

    impl ClientHandler for EndTickCounter {
        fn name(&self) -> &'static str {
            "end_tick_counter"
        }

        fn on_client_tick(&mut self, event: &TickEvent, _ctx: &mut ClientContext<'_>) {
            if event.phase == TickPhase::End {
                self.count.set(self.count.get() + 1);
            }
        }
    }

    fn clock(max_ticks_per_frame: u32) -> FixedStepClock {
        FixedStepClock::new(&LoopConfig {
            target_tps: 20,
            max_ticks_per_frame,
            ..LoopConfig::default()
        })
    }

    #[test]
    fn clock_runs_whole_ticks_and_carries_remainder() {
        let mut clock = clock(5);
        assert_eq!(
            clock.advance(Duration::from_millis(120)),
            Steps {
                ticks: 2,
                dropped: Duration::ZERO
            }
        );
        assert_eq!(clock.advance(Duration::from_millis(30)).ticks, 1);
    }

    #[test]
    fn clock_caps_one_long_frame() {
        let mut clock = clock(10);
        let steps = clock.advance(Duration::from_secs(3));
        assert_eq!(steps.ticks, 5, "250ms cap at 50ms per tick");
        assert_eq!(steps.dropped, Duration::ZERO);
    }

    #[test]
    fn clock_drops_backlog_past_tick_budget() {
        let mut clock = clock(3);
        let steps = clock.advance(Duration::from_millis(240));
        assert_eq!(steps.ticks, 3);
        assert_eq!(steps.dropped, Duration::from_millis(90));
        assert_eq!(clock.advance(Duration::ZERO).ticks, 0);
    }

    #[test]
    fn headless_run_requires_tick_limit() {
        let config = LoopConfig {
            realtime: false,
            max_ticks: None,
            ..LoopConfig::default()
        };
        let mut client = Client::new();
        assert!(matches!(
            run_client(&config, &mut client),
            Err(AppError::UnboundedHeadlessRun)
        ));
    }

    #[test]
    fn headless_run_executes_exactly_max_ticks() {
        let count = Rc::new(Cell::new(0));
        let mut client = Client::new();
        client.add_handler(Box::new(EndTickCounter {
            count: count.clone(),
        }));
        let config = LoopConfig {
            realtime: false,
            max_ticks: Some(37),
            ..LoopConfig::default()
        };

        let summary = run_client(&config, &mut client).expect("bounded run");
        assert_eq!(summary.ticks_run, 37);
        assert_eq!(count.get(), 37);
        assert_eq!(client.tick_count(), 37);
    }
}
