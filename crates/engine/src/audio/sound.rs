use std::cell::RefCell;
use std::rc::Rc;

use crate::resource::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundSource {
    Music,
    Player,
}

pub trait TickableSound {
    fn location(&self) -> &ResourceId;
    fn source(&self) -> SoundSource;
    fn volume(&self) -> f32;
    fn is_stopped(&self) -> bool;
    fn tick(&mut self);
}

pub type SharedSound = Rc<RefCell<dyn TickableSound>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundRequest {
    pub location: ResourceId,
    pub source: SoundSource,
}

impl SoundRequest {
    pub fn new(location: ResourceId, source: SoundSource) -> Self {
        Self { location, source }
    }

    pub(crate) fn describe(sound: &dyn TickableSound) -> Self {
        Self {
            location: sound.location().clone(),
            source: sound.source(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SoundDecision {
    #[default]
    Allow,
    Suppress,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundEvent {
    pub location: ResourceId,
    pub source: SoundSource,
}

impl SoundEvent {
    pub fn new(location: ResourceId, source: SoundSource) -> Self {
        Self { location, source }
    }
}
