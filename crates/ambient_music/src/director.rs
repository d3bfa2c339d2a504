use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use engine::{
    ClientContext, ClientHandler, ResourceId, SoundManager, TickEvent, TickPhase, TickableSound,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::instance::FadingMusicInstance;

pub const TRACK_FADE_TICKS: u32 = 40;
pub const INACTIVE_CLEANUP_TICKS: u32 = 200;

pub type SharedInstance = Rc<RefCell<FadingMusicInstance>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientTrack {
    pub id: ResourceId,
    pub length_ticks: u64,
}

#[derive(Debug, Default)]
pub struct MusicDirector {
    playlist: Vec<AmbientTrack>,
    next_track: usize,
    instances: BTreeMap<ResourceId, SharedInstance>,
    current: Option<ResourceId>,
}

impl MusicDirector {
    pub fn new(playlist: Vec<AmbientTrack>) -> Self {
        Self {
            playlist,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<&ResourceId> {
        self.current.as_ref()
    }

    pub fn instances(&self) -> impl Iterator<Item = (&ResourceId, &SharedInstance)> {
        self.instances.iter()
    }

    pub fn instance(&self, id: &ResourceId) -> Option<&SharedInstance> {
        self.instances.get(id)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn current_volume(&self) -> Option<f32> {
        let current = self.current.as_ref()?;
        let instance = self.instances.get(current)?;
        let volume = instance.try_borrow().ok()?.volume();
        Some(volume)
    }

    pub fn tick(&mut self, sounds: &mut SoundManager) {
        self.instances
            .retain(|_, instance| instance.try_borrow().map_or(true, |inst| !inst.is_stopped()));
        if self
            .current
            .as_ref()
            .is_some_and(|current| !self.instances.contains_key(current))
        {
            self.current = None;
        }

        if self.current.is_none() {
            self.start_next(sounds);
        } else if self.current_track_finished() {
            self.retire_current();
            self.start_next(sounds);
        }

        let current = self.current.clone();
        self.instances.retain(|id, instance| {
            if Some(id) == current.as_ref() {
                return true;
            }
            let Ok(mut instance) = instance.try_borrow_mut() else {
                return true;
            };
            if instance.is_active() {
                return true;
            }
            instance.count_inactive_tick();
            if instance.inactive_ticks() >= INACTIVE_CLEANUP_TICKS {
                debug!(track = %id, "ambient_instance_retired");
                instance.stop();
                return false;
            }
            true
        });
    }

    fn current_track_finished(&self) -> bool {
        let Some(current) = self.current.as_ref() else {
            return false;
        };
        let Some(length_ticks) = self
            .playlist
            .iter()
            .find(|track| &track.id == current)
            .map(|track| track.length_ticks)
        else {
            return false;
        };
        self.instances
            .get(current)
            .and_then(|instance| instance.try_borrow().ok().map(|inst| inst.played_ticks()))
            .is_some_and(|played| played >= length_ticks)
    }

    fn retire_current(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        if let Some(instance) = self.instances.get(&current) {
            if let Ok(mut instance) = instance.try_borrow_mut() {
                instance.set_active(false);
                instance.fade_to(0.0, TRACK_FADE_TICKS);
            }
        }
    }

    fn start_next(&mut self, sounds: &mut SoundManager) {
        if self.playlist.is_empty() {
            return;
        }
        let track = self.playlist[self.next_track % self.playlist.len()].clone();
        self.next_track = self.next_track.wrapping_add(1);

        if let Some(previous) = self.instances.remove(&track.id) {
            if let Ok(mut previous) = previous.try_borrow_mut() {
                previous.stop();
            }
        }

        let mut instance = FadingMusicInstance::new(track.id.clone());
        instance.fade_to(1.0, TRACK_FADE_TICKS);
        let instance = Rc::new(RefCell::new(instance));
        sounds.play(instance.clone());
        self.instances.insert(track.id.clone(), instance);
        info!(track = %track.id, length_ticks = track.length_ticks, "ambient_track_started");
        self.current = Some(track.id);
    }
}

pub struct AmbientMusicHandler {
    director: Rc<RefCell<MusicDirector>>,
}

impl AmbientMusicHandler {
    pub fn new(director: Rc<RefCell<MusicDirector>>) -> Self {
        Self { director }
    }
}

impl ClientHandler for AmbientMusicHandler {
    fn name(&self) -> &'static str {
        "ambient_music"
    }

    fn on_client_tick(&mut self, event: &TickEvent, ctx: &mut ClientContext<'_>) {
        if event.phase != TickPhase::End {
            return;
        }
        match self.director.try_borrow_mut() {
            Ok(mut director) => director.tick(ctx.sounds),
            Err(_) => warn!(tick = event.tick, "ambient_director_busy"),
        }
    }
}
