use std::rc::Rc;

use tracing::{debug, trace};

use super::sound::{SharedSound, SoundDecision, SoundRequest};
use crate::resource::ResourceId;

/// Mixer front-end.
///
/// `play` only queues a request; the owning client passes every queued
/// request through the interception hooks right before it starts, so a hook
/// can still replace it with nothing.
#[derive(Default)]
pub struct SoundManager {
    pending: Vec<SharedSound>,
    playing: Vec<SharedSound>,
    started_total: u64,
    suppressed_total: u64,
}

impl SoundManager {
    pub fn play(&mut self, sound: SharedSound) {
        self.pending.push(sound);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn playing_count(&self) -> usize {
        self.playing.len()
    }

    pub fn started_total(&self) -> u64 {
        self.started_total
    }

    pub fn suppressed_total(&self) -> u64 {
        self.suppressed_total
    }

    pub fn flush_pending<F>(&mut self, mut decide: F)
    where
        F: FnMut(&SoundRequest) -> SoundDecision,
    {
        for sound in std::mem::take(&mut self.pending) {
            let request = SoundRequest::describe(&*sound.borrow());
            match decide(&request) {
                SoundDecision::Allow => {
                    trace!(sound = %request.location, "sound_started");
                    self.started_total = self.started_total.saturating_add(1);
                    self.playing.push(sound);
                }
                SoundDecision::Suppress => {
                    debug!(sound = %request.location, "sound_suppressed");
                    self.suppressed_total = self.suppressed_total.saturating_add(1);
                }
            }
        }
    }

    pub fn tick(&mut self) {
        for sound in &self.playing {
            let mut sound = sound.borrow_mut();
            if !sound.is_stopped() {
                sound.tick();
            }
        }
        self.playing.retain(|sound| {
            let sound = sound.borrow();
            let keep = !sound.is_stopped();
            if !keep {
                trace!(sound = %sound.location(), "sound_released");
            }
            keep
        });
    }

    pub fn is_playing(&self, location: &ResourceId) -> bool {
        self.playing
            .iter()
            .any(|sound| sound.borrow().location() == location)
    }

    pub fn is_playing_instance(&self, sound: &SharedSound) -> bool {
        self.playing
            .iter()
            .any(|playing| Rc::ptr_eq(playing, sound))
    }

    pub fn volume_of(&self, location: &ResourceId) -> Option<f32> {
        self.playing
            .iter()
            .map(|sound| sound.borrow())
            .filter(|sound| sound.location() == location)
            .map(|sound| sound.volume())
            .reduce(f32::max)
    }

    pub fn stop_all(&mut self) {
        self.pending.clear();
        self.playing.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::audio::{SoundSource, TickableSound};

    struct CountdownSound {
        location: ResourceId,
        remaining: u32,
        ticks: u32,
    }

    impl TickableSound for CountdownSound {
        fn location(&self) -> &ResourceId {
            &self.location
        }

        fn source(&self) -> SoundSource {
            SoundSource::Music
        }

        fn volume(&self) -> f32 {
            1.0
        }

        fn is_stopped(&self) -> bool {
            self.remaining == 0
        }

        fn tick(&mut self) {
            self.ticks += 1;
            self.remaining = self.remaining.saturating_sub(1);
        }
    }

    fn countdown(path: &str, remaining: u32) -> Rc<RefCell<CountdownSound>> {
        Rc::new(RefCell::new(CountdownSound {
            location: ResourceId::new("test", path).expect("id"),
            remaining,
            ticks: 0,
        }))
    }

    #[test]
    fn play_is_deferred_until_flush() {
        let mut sounds = SoundManager::default();
        let sound: SharedSound = countdown("a", 3);
        sounds.play(Rc::clone(&sound));
        assert_eq!(sounds.pending_count(), 1);
        assert_eq!(sounds.playing_count(), 0);

        sounds.flush_pending(|_| SoundDecision::Allow);
        assert_eq!(sounds.pending_count(), 0);
        assert!(sounds.is_playing_instance(&sound));
        assert_eq!(sounds.started_total(), 1);
    }

    #[test]
    fn suppressed_requests_never_start() {
        let mut sounds = SoundManager::default();
        sounds.play(countdown("blocked", 3));
        sounds.play(countdown("allowed", 3));

        sounds.flush_pending(|request| {
            if request.location.path() == "blocked" {
                SoundDecision::Suppress
            } else {
                SoundDecision::Allow
            }
        });

        assert_eq!(sounds.playing_count(), 1);
        assert_eq!(sounds.suppressed_total(), 1);
        assert!(sounds.is_playing(&ResourceId::new("test", "allowed").expect("id")));
    }

    #[test]
    fn tick_advances_and_releases_stopped_sounds() {
        let mut sounds = SoundManager::default();
        let sound = countdown("short", 2);
        sounds.play(sound.clone());
        sounds.flush_pending(|_| SoundDecision::Allow);

        sounds.tick();
        assert_eq!(sounds.playing_count(), 1);
        sounds.tick();
        assert_eq!(sounds.playing_count(), 0);
        assert_eq!(sound.borrow().ticks, 2);
    }
}
