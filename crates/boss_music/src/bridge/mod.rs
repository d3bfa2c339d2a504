use engine::{ResourceId, ServiceRegistry};
use thiserror::Error;
use tracing::{info, trace, warn};

use crate::config::ArbiterConfig;

mod director_probe;

pub use director_probe::DirectorProbe;

/// Failure of the link itself. Any of these disconnects the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("ambient music service {service} is not published")]
    SubsystemAbsent { service: &'static str },
    #[error("ambient music layout version mismatch: expected {expected}, found {found}")]
    LayoutMismatch { expected: u32, found: u32 },
    #[error("ambient music service {service} has unexpected type {found}")]
    TypeMismatch {
        service: &'static str,
        found: &'static str,
    },
    #[error("ambient music director is unreachable while {operation}")]
    Unreachable { operation: &'static str },
}

/// Failure of one call on one instance. Logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("ambient instance {instance} is no longer live")]
    Missing { instance: ResourceId },
    #[error("ambient instance {instance} is in use")]
    Busy { instance: ResourceId },
}

pub trait AmbientMusicBackend {
    fn describe(&self) -> String;
    fn live_instances(&self) -> Result<Vec<ResourceId>, BridgeError>;
    fn current(&self) -> Result<Option<ResourceId>, BridgeError>;
    fn fade_to(&mut self, instance: &ResourceId, target: f32, ticks: u32)
        -> Result<(), InstanceError>;
    fn set_active(&mut self, instance: &ResourceId, active: bool) -> Result<(), InstanceError>;
    fn reset_inactive_ticks(&mut self, instance: &ResourceId) -> Result<(), InstanceError>;
}

pub trait CapabilityProbe {
    fn probe(
        &mut self,
        services: &ServiceRegistry,
    ) -> Result<Box<dyn AmbientMusicBackend>, BridgeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    Unprobed,
    Connected,
    Disconnected,
}

enum BridgeLink {
    Unprobed,
    Connected(Box<dyn AmbientMusicBackend>),
    Disconnected,
}

pub struct AmbientAudioBridge {
    probe: Box<dyn CapabilityProbe>,
    link: BridgeLink,
    mute_fade_ticks: u32,
    restore_fade_ticks: u32,
}

impl AmbientAudioBridge {
    pub fn new(probe: Box<dyn CapabilityProbe>, config: &ArbiterConfig) -> Self {
        Self {
            probe,
            link: BridgeLink::Unprobed,
            mute_fade_ticks: config.ambient_mute_fade_ticks,
            restore_fade_ticks: config.ambient_restore_fade_ticks,
        }
    }

    pub fn status(&self) -> BridgeStatus {
        match self.link {
            BridgeLink::Unprobed => BridgeStatus::Unprobed,
            BridgeLink::Connected(_) => BridgeStatus::Connected,
            BridgeLink::Disconnected => BridgeStatus::Disconnected,
        }
    }

    pub fn init_attempted(&self) -> bool {
        self.status() != BridgeStatus::Unprobed
    }

    pub fn is_available(&self) -> bool {
        self.status() == BridgeStatus::Connected
    }

    pub fn mute_tick(&mut self, services: &ServiceRegistry) {
        let fade_ticks = self.mute_fade_ticks;
        let Some(backend) = self.backend(services) else {
            return;
        };
        if let Err(error) = mute_instances(backend, fade_ticks) {
            self.disconnect("mute_tick", error);
        }
    }

    pub fn unmute_now(&mut self, services: &ServiceRegistry) {
        let fade_ticks = self.restore_fade_ticks;
        let Some(backend) = self.backend(services) else {
            return;
        };
        if let Err(error) = restore_current(backend, fade_ticks) {
            self.disconnect("unmute_now", error);
        }
    }

    fn backend(
        &mut self,
        services: &ServiceRegistry,
    ) -> Option<&mut (dyn AmbientMusicBackend + 'static)> {
        if matches!(self.link, BridgeLink::Unprobed) {
            self.link = match self.probe.probe(services) {
                Ok(backend) => {
                    info!(backend = %backend.describe(), "ambient_bridge_connected");
                    BridgeLink::Connected(backend)
                }
                Err(error) => {
                    warn!(error = %error, "ambient_bridge_unavailable");
                    BridgeLink::Disconnected
                }
            };
        }
        match &mut self.link {
            BridgeLink::Connected(backend) => Some(backend.as_mut()),
            BridgeLink::Unprobed | BridgeLink::Disconnected => None,
        }
    }

    fn disconnect(&mut self, operation: &'static str, error: BridgeError) {
        warn!(operation, error = %error, "ambient_bridge_disabled");
        self.link = BridgeLink::Disconnected;
    }
}

fn mute_instances(
    backend: &mut dyn AmbientMusicBackend,
    fade_ticks: u32,
) -> Result<(), BridgeError> {
    for instance in backend.live_instances()? {
        if let Err(error) = backend.fade_to(&instance, 0.0, fade_ticks) {
            trace!(error = %error, "ambient_instance_call_failed");
        }
        // Muted tracks keep time; keep them out of the subsystem's idle cleanup.
        if let Err(error) = backend.reset_inactive_ticks(&instance) {
            trace!(error = %error, "ambient_instance_call_failed");
        }
    }
    Ok(())
}

fn restore_current(
    backend: &mut dyn AmbientMusicBackend,
    fade_ticks: u32,
) -> Result<(), BridgeError> {
    let Some(current) = backend.current()? else {
        return Ok(());
    };
    if !backend.live_instances()?.contains(&current) {
        return Ok(());
    }
    if let Err(error) = backend.set_active(&current, true) {
        trace!(error = %error, "ambient_instance_call_failed");
    }
    if let Err(error) = backend.fade_to(&current, 1.0, fade_ticks) {
        trace!(error = %error, "ambient_instance_call_failed");
    }
    if let Err(error) = backend.reset_inactive_ticks(&current) {
        trace!(error = %error, "ambient_instance_call_failed");
    }
    info!(track = %current, fade_ticks, "ambient_track_restored");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, HashSet};
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    pub(crate) struct InstanceRecord {
        pub(crate) target: Option<f32>,
        pub(crate) fade_ticks: u32,
        pub(crate) active: bool,
        pub(crate) inactive_resets: u32,
    }

    #[derive(Debug, Default)]
    pub(crate) struct BackendState {
        pub(crate) instances: Vec<ResourceId>,
        pub(crate) current: Option<ResourceId>,
        pub(crate) failing: HashSet<ResourceId>,
        pub(crate) list_fails: bool,
        pub(crate) records: HashMap<ResourceId, InstanceRecord>,
        pub(crate) mute_passes: u32,
        pub(crate) restores: u32,
    }

    impl BackendState {
        pub(crate) fn with_tracks(paths: &[&str]) -> Self {
            let instances = paths
                .iter()
                .map(|path| ResourceId::new("ambient", path).expect("id"))
                .collect::<Vec<_>>();
            Self {
                current: instances.first().cloned(),
                instances,
                ..Self::default()
            }
        }

        pub(crate) fn record(&self, path: &str) -> InstanceRecord {
            let id = ResourceId::new("ambient", path).expect("id");
            self.records.get(&id).cloned().unwrap_or_default()
        }
    }

    pub(crate) struct FakeBackend {
        pub(crate) state: Rc<RefCell<BackendState>>,
    }

    impl FakeBackend {
        fn touch(&mut self, instance: &ResourceId) -> Result<(), InstanceError> {
            let state = self.state.borrow();
            if !state.instances.contains(instance) {
                return Err(InstanceError::Missing {
                    instance: instance.clone(),
                });
            }
            if state.failing.contains(instance) {
                return Err(InstanceError::Busy {
                    instance: instance.clone(),
                });
            }
            Ok(())
        }
    }

    impl AmbientMusicBackend for FakeBackend {
        fn describe(&self) -> String {
            "fake".to_string()
        }

        fn live_instances(&self) -> Result<Vec<ResourceId>, BridgeError> {
            let state = self.state.borrow();
            if state.list_fails {
                return Err(BridgeError::Unreachable {
                    operation: "listing instances",
                });
            }
            Ok(state.instances.clone())
        }

        fn current(&self) -> Result<Option<ResourceId>, BridgeError> {
            Ok(self.state.borrow().current.clone())
        }

        fn fade_to(
            &mut self,
            instance: &ResourceId,
            target: f32,
            ticks: u32,
        ) -> Result<(), InstanceError> {
            self.touch(instance)?;
            let mut state = self.state.borrow_mut();
            if target == 0.0 {
                state.mute_passes += 1;
            } else {
                state.restores += 1;
            }
            let record = state.records.entry(instance.clone()).or_default();
            record.target = Some(target);
            record.fade_ticks = ticks;
            Ok(())
        }

        fn set_active(&mut self, instance: &ResourceId, active: bool) -> Result<(), InstanceError> {
            self.touch(instance)?;
            let mut state = self.state.borrow_mut();
            state.records.entry(instance.clone()).or_default().active = active;
            Ok(())
        }

        fn reset_inactive_ticks(&mut self, instance: &ResourceId) -> Result<(), InstanceError> {
            self.touch(instance)?;
            let mut state = self.state.borrow_mut();
            state
                .records
                .entry(instance.clone())
                .or_default()
                .inactive_resets += 1;
            Ok(())
        }
    }

    pub(crate) struct FakeProbe {
        pub(crate) state: Option<Rc<RefCell<BackendState>>>,
        pub(crate) probes: Rc<Cell<u32>>,
    }

    impl CapabilityProbe for FakeProbe {
        fn probe(
            &mut self,
            _services: &ServiceRegistry,
        ) -> Result<Box<dyn AmbientMusicBackend>, BridgeError> {
            self.probes.set(self.probes.get() + 1);
            match &self.state {
                Some(state) => Ok(Box::new(FakeBackend {
                    state: state.clone(),
                })),
                None => Err(BridgeError::SubsystemAbsent {
                    service: "test:ambient",
                }),
            }
        }
    }

    pub(crate) fn bridge_with(
        state: Option<Rc<RefCell<BackendState>>>,
    ) -> (AmbientAudioBridge, Rc<Cell<u32>>) {
        let probes = Rc::new(Cell::new(0));
        let probe = FakeProbe {
            state,
            probes: probes.clone(),
        };
        (
            AmbientAudioBridge::new(Box::new(probe), &ArbiterConfig::default()),
            probes,
        )
    }
}
