use engine::{ResourceId, SoundSource, TickableSound};

#[derive(Debug, Clone)]
pub struct FadingMusicInstance {
    location: ResourceId,
    volume: f32,
    fade_from: f32,
    fade_to: f32,
    fade_ticks: u32,
    fade_elapsed: u32,
    active: bool,
    inactive_ticks: u32,
    played_ticks: u64,
    stopped: bool,
}

impl FadingMusicInstance {
    pub fn new(location: ResourceId) -> Self {
        Self {
            location,
            volume: 0.0,
            fade_from: 0.0,
            fade_to: 0.0,
            fade_ticks: 0,
            fade_elapsed: 0,
            active: true,
            inactive_ticks: 0,
            played_ticks: 0,
            stopped: false,
        }
    }

    pub fn fade_to(&mut self, target: f32, ticks: u32) {
        let target = target.clamp(0.0, 1.0);
        if target == self.fade_to && (self.fade_elapsed < self.fade_ticks || self.volume == target)
        {
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

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if active {
            self.inactive_ticks = 0;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn inactive_ticks(&self) -> u32 {
        self.inactive_ticks
    }

    pub fn set_inactive_ticks(&mut self, ticks: u32) {
        self.inactive_ticks = ticks;
    }

    pub(crate) fn count_inactive_tick(&mut self) {
        self.inactive_ticks = self.inactive_ticks.saturating_add(1);
    }

    pub fn played_ticks(&self) -> u64 {
        self.played_ticks
    }

    pub fn target_volume(&self) -> f32 {
        self.fade_to
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }
}

impl TickableSound for FadingMusicInstance {
    fn location(&self) -> &ResourceId {
        &self.location
    }

    fn source(&self) -> SoundSource {
        SoundSource::Music
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
        if self.fade_elapsed < self.fade_ticks {
            self.fade_elapsed += 1;
            let progress = self.fade_elapsed as f32 / self.fade_ticks as f32;
            self.volume = self.fade_from + (self.fade_to - self.fade_from) * progress;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> FadingMusicInstance {
        FadingMusicInstance::new(ResourceId::parse("ambient:day").expect("id"))
    }

    #[test]
    fn fade_reaches_target_after_requested_ticks() {
        let mut music = instance();
        music.fade_to(1.0, 4);
        for _ in 0..3 {
            music.tick();
        }
        assert!(music.volume() < 1.0);
        music.tick();
        assert_eq!(music.volume(), 1.0);
    }

    #[test]
    fn repeated_fade_requests_do_not_restart_the_ramp() {
        let mut music = instance();
        music.fade_to(1.0, 4);
        music.tick();
        music.tick();
        music.fade_to(1.0, 4);
        music.tick();
        music.tick();
        assert_eq!(music.volume(), 1.0);
    }

    #[test]
    fn activation_resets_inactivity() {
        let mut music = instance();
        music.set_active(false);
        music.count_inactive_tick();
        music.count_inactive_tick();
        assert_eq!(music.inactive_ticks(), 2);
        music.set_active(true);
        assert_eq!(music.inactive_ticks(), 0);
    }

    #[test]
    fn stopped_instance_ignores_ticks() {
        let mut music = instance();
        music.fade_to(1.0, 2);
        music.stop();
        music.tick();
        assert_eq!(music.volume(), 0.0);
        assert_eq!(music.played_ticks(), 0);
    }
}
