use engine::{ResourceId, SoundEvent, SoundSource, TickableSound};

use crate::boss::BossType;

const HARD_STOP_VOLUME: f32 = 0.001;

#[derive(Debug, Clone)]
pub struct BossThemeSound {
    boss: BossType,
    location: ResourceId,
    source: SoundSource,
    volume: f32,
    fade_from: f32,
    fade_to: f32,
    fade_ticks: u32,
    fade_elapsed: u32,
    hard_stop_after_fade: bool,
    stopped: bool,
    played_ticks: u64,
}

impl BossThemeSound {
    pub fn new(boss: BossType, event: &SoundEvent) -> Self {
        Self {
            boss,
            location: event.location.clone(),
            source: event.source,
            volume: 0.0,
            fade_from: 0.0,
            fade_to: 0.0,
            fade_ticks: 0,
            fade_elapsed: 0,
            hard_stop_after_fade: false,
            stopped: false,
            played_ticks: 0,
        }
    }

    pub fn boss(&self) -> BossType {
        self.boss
    }

    pub fn target_volume(&self) -> f32 {
        self.fade_to
    }

    pub fn is_fading(&self) -> bool {
        self.fade_elapsed < self.fade_ticks
    }

    pub fn played_ticks(&self) -> u64 {
        self.played_ticks
    }

    pub fn is_hard_stop_requested(&self) -> bool {
        self.hard_stop_after_fade
    }

    pub fn request_hard_stop_after_fade(&mut self) {
        self.hard_stop_after_fade = true;
    }

    pub fn cancel_hard_stop(&mut self) {
        if !self.stopped {
            self.hard_stop_after_fade = false;
        }
    }

    /// Retargets the fade, starting from the current volume. Asking again for
    /// the target already being approached (or already reached) is a no-op,
    /// so the call is safe to repeat every tick.
    pub fn fade_to(&mut self, target: f32, ticks: u32) {
        if self.stopped {
            return;
        }
        let target = target.clamp(0.0, 1.0);
        if target == self.fade_to && (self.is_fading() || self.volume == target) {
            return;
        }
        self.fade_from = self.volume;
        self.fade_to = target;
        self.fade_elapsed = 0;
        self.fade_ticks = ticks;
        if ticks == 0 {
            self.volume = target;
        }
    }
}

impl TickableSound for BossThemeSound {
    fn location(&self) -> &ResourceId {
        &self.location
    }

    fn source(&self) -> SoundSource {
        self.source
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn tick(&mut self) {
        if self.stopped {
            return;
        }
        self.played_ticks = self.played_ticks.saturating_add(1);
        if self.is_fading() {
            self.fade_elapsed += 1;
            let progress = self.fade_elapsed as f32 / self.fade_ticks as f32;
            self.volume = self.fade_from + (self.fade_to - self.fade_from) * progress;
        }
        if self.hard_stop_after_fade && self.volume <= HARD_STOP_VOLUME {
            self.volume = 0.0;
            self.stopped = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> BossThemeSound {
        let event = SoundEvent::new(
            ResourceId::parse("boss_music:theme.frostmaw").expect("id"),
            SoundSource::Music,
        );
        BossThemeSound::new(BossType::Frostmaw, &event)
    }

    fn tick_n(sound: &mut BossThemeSound, ticks: u32) {
        for _ in 0..ticks {
            sound.tick();
        }
    }

    #[test]
    fn fade_in_reaches_full_volume_after_exactly_requested_ticks() {
        let mut sound = theme();
        sound.fade_to(1.0, 40);
        tick_n(&mut sound, 39);
        assert!(sound.volume() < 1.0);
        sound.tick();
        assert_eq!(sound.volume(), 1.0);
        assert!(!sound.is_fading());
    }

    #[test]
    fn fade_is_linear() {
        let mut sound = theme();
        sound.fade_to(1.0, 40);
        tick_n(&mut sound, 10);
        assert!((sound.volume() - 0.25).abs() < 1e-6);
        tick_n(&mut sound, 10);
        assert!((sound.volume() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn repeating_same_target_does_not_restart_fade() {
        let mut sound = theme();
        sound.fade_to(1.0, 40);
        for _ in 0..40 {
            sound.fade_to(1.0, 40);
            sound.tick();
        }
        assert_eq!(sound.volume(), 1.0);
    }

    #[test]
    fn retarget_mid_fade_starts_from_current_volume() {
        let mut sound = theme();
        sound.fade_to(1.0, 40);
        tick_n(&mut sound, 20);
        sound.fade_to(0.0, 40);
        sound.tick();
        assert!((sound.volume() - (0.5 - 0.5 / 40.0)).abs() < 1e-6);
    }

    #[test]
    fn silent_theme_keeps_playing_without_hard_stop() {
        let mut sound = theme();
        sound.fade_to(1.0, 4);
        tick_n(&mut sound, 4);
        sound.fade_to(0.0, 4);
        tick_n(&mut sound, 10);
        assert_eq!(sound.volume(), 0.0);
        assert!(!sound.is_stopped());
        assert_eq!(sound.played_ticks(), 14);
    }

    #[test]
    fn hard_stop_ends_playback_when_fade_completes() {
        let mut sound = theme();
        sound.fade_to(1.0, 4);
        tick_n(&mut sound, 4);
        sound.request_hard_stop_after_fade();
        sound.fade_to(0.0, 40);
        tick_n(&mut sound, 39);
        assert!(!sound.is_stopped());
        sound.tick();
        assert!(sound.is_stopped());

        sound.fade_to(1.0, 40);
        sound.tick();
        assert_eq!(sound.volume(), 0.0, "stopped themes stay inert");
    }

    #[test]
    fn cancelled_hard_stop_keeps_theme_alive_through_silence() {
        let mut sound = theme();
        sound.fade_to(1.0, 4);
        tick_n(&mut sound, 4);
        sound.request_hard_stop_after_fade();
        sound.fade_to(0.0, 4);
        tick_n(&mut sound, 2);

        sound.cancel_hard_stop();
        assert!(!sound.is_hard_stop_requested());
        tick_n(&mut sound, 10);
        assert_eq!(sound.volume(), 0.0);
        assert!(!sound.is_stopped());
    }

    #[test]
    fn hard_stop_on_already_silent_theme_stops_next_tick() {
        let mut sound = theme();
        sound.request_hard_stop_after_fade();
        sound.fade_to(0.0, 40);
        sound.tick();
        assert!(sound.is_stopped());
    }
}
