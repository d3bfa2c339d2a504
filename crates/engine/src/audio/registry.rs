use std::collections::HashMap;

use thiserror::Error;

use super::sound::SoundEvent;
use crate::resource::ResourceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoundLookupError {
    #[error("sound event {id} is not registered")]
    NotRegistered { id: ResourceId },
}

#[derive(Debug, Default)]
pub struct SoundRegistry {
    events: HashMap<ResourceId, SoundEvent>,
}

impl SoundRegistry {
    pub fn register(&mut self, event: SoundEvent) -> Option<SoundEvent> {
        self.events.insert(event.location.clone(), event)
    }

    pub fn get(&self, id: &ResourceId) -> Result<&SoundEvent, SoundLookupError> {
        self.events
            .get(id)
            .ok_or_else(|| SoundLookupError::NotRegistered { id: id.clone() })
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.events.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundSource;

    #[test]
    fn lookup_reports_missing_ids() {
        let mut registry = SoundRegistry::default();
        let id = ResourceId::parse("test:music.theme").expect("id");
        assert_eq!(
            registry.get(&id),
            Err(SoundLookupError::NotRegistered { id: id.clone() })
        );

        registry.register(SoundEvent::new(id.clone(), SoundSource::Music));
        assert_eq!(registry.get(&id).expect("registered").location, id);
        assert_eq!(registry.len(), 1);
    }
}
