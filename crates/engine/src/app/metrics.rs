use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::audio::SoundManager;

static POISON_REPORTED: AtomicBool = AtomicBool::new(false);

fn report_poison_once(operation: &'static str) {
    if !POISON_REPORTED.swap(true, Ordering::Relaxed) {
        warn!(operation, "loop metrics lock poisoned; continuing with last value");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub tps: f32,
    pub avg_tick_ms: f32,
    pub max_tick_ms: f32,
    pub playing_sounds: usize,
    pub suppressed_sounds: u64,
}

#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.latest.read().unwrap_or_else(|poisoned| {
            report_poison_once("read");
            poisoned.into_inner()
        })
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        let mut latest = self.latest.write().unwrap_or_else(|poisoned| {
            report_poison_once("write");
            poisoned.into_inner()
        });
        *latest = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct TickWindow {
    opened_at: Instant,
    length: Duration,
    ticks: u32,
    busy: Duration,
    slowest: Duration,
    suppressed_at_open: u64,
}

impl TickWindow {
    pub(crate) fn open(length: Duration, sounds: &SoundManager) -> Self {
        Self::open_at(Instant::now(), length, sounds.suppressed_total())
    }

    fn open_at(opened_at: Instant, length: Duration, suppressed_at_open: u64) -> Self {
        Self {
            opened_at,
            length,
            ticks: 0,
            busy: Duration::ZERO,
            slowest: Duration::ZERO,
            suppressed_at_open,
        }
    }

    pub(crate) fn record_tick(&mut self, tick_time: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        self.busy = self.busy.saturating_add(tick_time);
        self.slowest = self.slowest.max(tick_time);
    }

    pub(crate) fn close_if_elapsed(
        &mut self,
        now: Instant,
        sounds: &SoundManager,
    ) -> Option<LoopMetricsSnapshot> {
        self.close_with(now, sounds.playing_count(), sounds.suppressed_total())
    }

    fn close_with(
        &mut self,
        now: Instant,
        playing_sounds: usize,
        suppressed_total: u64,
    ) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.opened_at);
        if elapsed < self.length {
            return None;
        }

        let avg_tick_ms = match self.ticks {
            0 => 0.0,
            ticks => self.busy.as_secs_f32() * 1000.0 / ticks as f32,
        };
        let snapshot = LoopMetricsSnapshot {
            tps: self.ticks as f32 / elapsed.as_secs_f32().max(f32::EPSILON),
            avg_tick_ms,
            max_tick_ms: self.slowest.as_secs_f32() * 1000.0,
            playing_sounds,
            suppressed_sounds: suppressed_total.saturating_sub(self.suppressed_at_open),
        };

        *self = Self::open_at(now, self.length, suppressed_total);
        Some(snapshot)
    }
}
