use std::cell::RefCell;
use std::rc::Rc;

use ambient_music::{
    FadingMusicInstance, MusicDirector, SharedInstance, DIRECTOR_LAYOUT_VERSION, DIRECTOR_SERVICE,
};
use engine::{ResourceId, ServiceRegistry};

use super::{AmbientMusicBackend, BridgeError, CapabilityProbe, InstanceError};

/// Finds the ambient music director through the service registry.
///
/// Only the exact layout version it was written against is accepted; a newer
/// or older director is treated the same as a missing one.
#[derive(Debug, Default)]
pub struct DirectorProbe;

impl CapabilityProbe for DirectorProbe {
    fn probe(
        &mut self,
        services: &ServiceRegistry,
    ) -> Result<Box<dyn AmbientMusicBackend>, BridgeError> {
        let entry = services
            .lookup(DIRECTOR_SERVICE)
            .ok_or(BridgeError::SubsystemAbsent {
                service: DIRECTOR_SERVICE,
            })?;
        if entry.layout_version() != DIRECTOR_LAYOUT_VERSION {
            return Err(BridgeError::LayoutMismatch {
                expected: DIRECTOR_LAYOUT_VERSION,
                found: entry.layout_version(),
            });
        }
        let director = entry
            .downcast::<RefCell<MusicDirector>>()
            .ok_or(BridgeError::TypeMismatch {
                service: DIRECTOR_SERVICE,
                found: entry.type_name(),
            })?;
        Ok(Box::new(DirectorBackend { director }))
    }
}

struct DirectorBackend {
    director: Rc<RefCell<MusicDirector>>,
}

impl DirectorBackend {
    fn instance(&self, id: &ResourceId) -> Result<SharedInstance, InstanceError> {
        let director = self.director.try_borrow().map_err(|_| InstanceError::Busy {
            instance: id.clone(),
        })?;
        director
            .instance(id)
            .cloned()
            .ok_or_else(|| InstanceError::Missing { instance: id.clone() })
    }

    fn with_instance(
        &self,
        id: &ResourceId,
        apply: impl FnOnce(&mut FadingMusicInstance),
    ) -> Result<(), InstanceError> {
        let instance = self.instance(id)?;
        let mut instance = instance.try_borrow_mut().map_err(|_| InstanceError::Busy {
            instance: id.clone(),
        })?;
        apply(&mut instance);
        Ok(())
    }
}

impl AmbientMusicBackend for DirectorBackend {
    fn describe(&self) -> String {
        format!("{DIRECTOR_SERVICE}@v{DIRECTOR_LAYOUT_VERSION}")
    }

    fn live_instances(&self) -> Result<Vec<ResourceId>, BridgeError> {
        let director = self
            .director
            .try_borrow()
            .map_err(|_| BridgeError::Unreachable {
                operation: "listing instances",
            })?;
        Ok(director.instances().map(|(id, _)| id.clone()).collect())
    }

    fn current(&self) -> Result<Option<ResourceId>, BridgeError> {
        let director = self
            .director
            .try_borrow()
            .map_err(|_| BridgeError::Unreachable {
                operation: "reading the current track",
            })?;
        Ok(director.current().cloned())
    }

    fn fade_to(
        &mut self,
        instance: &ResourceId,
        target: f32,
        ticks: u32,
    ) -> Result<(), InstanceError> {
        self.with_instance(instance, |inst| inst.fade_to(target, ticks))
    }

    fn set_active(&mut self, instance: &ResourceId, active: bool) -> Result<(), InstanceError> {
        self.with_instance(instance, |inst| inst.set_active(active))
    }

    fn reset_inactive_ticks(&mut self, instance: &ResourceId) -> Result<(), InstanceError> {
        self.with_instance(instance, |inst| inst.set_inactive_ticks(0))
    }
}
