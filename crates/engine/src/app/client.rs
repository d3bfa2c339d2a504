use tracing::{debug, info};

use super::world::{ClientWorld, Entity, EntityId};
use crate::audio::{SoundDecision, SoundManager, SoundRegistry, SoundRequest};
use crate::services::ServiceRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    pub phase: TickPhase,
    pub tick: u64,
}

pub struct ClientContext<'a> {
    pub world: &'a mut ClientWorld,
    pub listener: Option<EntityId>,
    pub sounds: &'a mut SoundManager,
    pub sound_registry: &'a SoundRegistry,
    pub services: &'a ServiceRegistry,
}

impl ClientContext<'_> {
    pub fn listener_entity(&self) -> Option<&Entity> {
        self.listener.and_then(|id| self.world.find_entity(id))
    }
}

pub trait ClientHandler {
    fn name(&self) -> &'static str;

    fn on_client_tick(&mut self, event: &TickEvent, ctx: &mut ClientContext<'_>);

    fn on_play_sound(&mut self, _request: &SoundRequest) -> SoundDecision {
        SoundDecision::Allow
    }

    fn on_shutdown(&mut self) {}
}

#[derive(Default)]
pub struct Client {
    world: ClientWorld,
    listener: Option<EntityId>,
    sounds: SoundManager,
    sound_registry: SoundRegistry,
    services: ServiceRegistry,
    handlers: Vec<Box<dyn ClientHandler>>,
    tick_count: u64,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, handler: Box<dyn ClientHandler>) {
        info!(handler = handler.name(), "handler_registered");
        self.handlers.push(handler);
    }

    pub fn set_listener(&mut self, listener: Option<EntityId>) {
        self.listener = listener;
    }

    pub fn listener(&self) -> Option<EntityId> {
        self.listener
    }

    pub fn world(&self) -> &ClientWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut ClientWorld {
        &mut self.world
    }

    pub fn sounds(&self) -> &SoundManager {
        &self.sounds
    }

    pub fn sound_registry(&self) -> &SoundRegistry {
        &self.sound_registry
    }

    pub fn sound_registry_mut(&mut self) -> &mut SoundRegistry {
        &mut self.sound_registry
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn run_tick(&mut self) {
        let tick = self.tick_count;
        self.dispatch(TickEvent {
            phase: TickPhase::Start,
            tick,
        });
        self.world.apply_pending();
        self.dispatch(TickEvent {
            phase: TickPhase::End,
            tick,
        });

        let handlers = &mut self.handlers;
        self.sounds.flush_pending(|request| {
            let mut decision = SoundDecision::Allow;
            for handler in handlers.iter_mut() {
                if handler.on_play_sound(request) == SoundDecision::Suppress {
                    debug!(
                        handler = handler.name(),
                        sound = %request.location,
                        "sound_request_intercepted"
                    );
                    decision = SoundDecision::Suppress;
                    break;
                }
            }
            decision
        });
        self.sounds.tick();
        self.tick_count = self.tick_count.saturating_add(1);
    }

    pub fn shutdown(&mut self) {
        for handler in &mut self.handlers {
            handler.on_shutdown();
        }
        self.sounds.stop_all();
        info!(ticks = self.tick_count, "client_shutdown");
    }

    fn dispatch(&mut self, event: TickEvent) {
        let mut ctx = ClientContext {
            world: &mut self.world,
            listener: self.listener,
            sounds: &mut self.sounds,
            sound_registry: &self.sound_registry,
            services: &self.services,
        };
        for handler in &mut self.handlers {
            handler.on_client_tick(&event, &mut ctx);
        }
    }
}
