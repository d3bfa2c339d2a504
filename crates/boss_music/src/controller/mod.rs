use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use engine::{
    ClientContext, ClientHandler, ClientWorld, Entity, ResourceIdError, ServiceRegistry,
    SoundDecision, SoundEvent, SoundLookupError, SoundRegistry, SoundRequest, TickEvent,
    TickPhase, TickableSound,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::boss::{is_suppressed_boss_music, BossType};
use crate::bridge::{AmbientAudioBridge, BridgeStatus};
use crate::config::ArbiterConfig;
use crate::theme_sound::BossThemeSound;


pub type SharedTheme = Rc<RefCell<BossThemeSound>>;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("invalid theme id: {0}")]
    InvalidId(#[from] ResourceIdError),
    #[error(transparent)]
    NotRegistered(#[from] SoundLookupError),
}

#[derive(Debug, Default)]
pub struct ArbitrationState {
    current_boss: Option<BossType>,
    boss_sound: Option<SharedTheme>,
    was_in_range: bool,
    ticks_since_out_of_range: u32,
    om_override_active: bool,
}

impl ArbitrationState {
    pub fn current_boss(&self) -> Option<BossType> {
        self.current_boss
    }

    pub fn boss_sound(&self) -> Option<&SharedTheme> {
        self.boss_sound.as_ref()
    }

    pub fn was_in_range(&self) -> bool {
        self.was_in_range
    }

    pub fn ticks_since_out_of_range(&self) -> u32 {
        self.ticks_since_out_of_range
    }

    pub fn om_override_active(&self) -> bool {
        self.om_override_active
    }

    fn theme_is_live(&self) -> bool {
        self.boss_sound
            .as_ref()
            .is_some_and(|sound| !sound.borrow().is_stopped())
    }
}

pub struct ProximityMusicController {
    config: ArbiterConfig,
    state: ArbitrationState,
    bridge: AmbientAudioBridge,
    reported_missing_themes: HashSet<BossType>,
}

impl ProximityMusicController {
    pub fn new(config: ArbiterConfig, bridge: AmbientAudioBridge) -> Self {
        Self {
            config,
            state: ArbitrationState::default(),
            bridge,
            reported_missing_themes: HashSet::new(),
        }
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    pub fn state(&self) -> &ArbitrationState {
        &self.state
    }

    pub fn current_boss(&self) -> Option<BossType> {
        self.state.current_boss
    }

    pub fn boss_volume(&self) -> Option<f32> {
        self.state
            .boss_sound
            .as_ref()
            .map(|sound| sound.borrow().volume())
    }

    pub fn bridge_status(&self) -> BridgeStatus {
        self.bridge.status()
    }

    pub fn on_tick(&mut self, ctx: &mut ClientContext<'_>) {
        let Some(listener) = ctx.listener_entity() else {
            return;
        };
        let nearest = find_boss_in_range(ctx.world, listener, &self.config);

        match nearest {
            Some(boss) => self.on_boss_in_range(boss, ctx),
            None => self.on_boss_out_of_range(),
        }

        // A missing theme still counts: the boss is here, so ambient stays down.
        let mute = self.state.was_in_range || self.boss_music_audible();
        self.apply_ambient_override(mute, ctx.services);
    }

    pub fn on_sound_request(&self, request: &SoundRequest) -> SoundDecision {
        suppress_boss_mod_music(request)
    }

    fn on_boss_in_range(&mut self, boss: BossType, ctx: &mut ClientContext<'_>) {
        self.state.was_in_range = true;
        self.state.ticks_since_out_of_range = 0;

        if self.state.current_boss != Some(boss) {
            let previous = self.state.current_boss.take();
            if let Some(sound) = self.state.boss_sound.take() {
                let mut sound = sound.borrow_mut();
                sound.request_hard_stop_after_fade();
                sound.fade_to(0.0, self.config.fade_out_ticks);
            }
            if self.start_theme(boss, ctx) {
                info!(
                    boss = boss.name(),
                    previous = previous.map(BossType::name),
                    "boss_in_range"
                );
            }
            return;
        }

        if !self.state.theme_is_live() {
            if self.start_theme(boss, ctx) {
                info!(boss = boss.name(), "boss_theme_restarted");
            }
            return;
        }

        if let Some(sound) = &self.state.boss_sound {
            let mut sound = sound.borrow_mut();
            sound.cancel_hard_stop();
            sound.fade_to(1.0, self.config.fade_in_ticks);
        }
    }

    fn on_boss_out_of_range(&mut self) {
        let fade_out_ticks = self.config.fade_out_ticks;
        if self.state.was_in_range {
            self.state.was_in_range = false;
            self.state.ticks_since_out_of_range = 0;
            if let Some(sound) = &self.state.boss_sound {
                sound.borrow_mut().fade_to(0.0, fade_out_ticks);
            }
            info!(
                boss = self.state.current_boss.map(BossType::name),
                "boss_out_of_range"
            );
        }

        let Some(sound) = self.state.boss_sound.clone() else {
            self.state.current_boss = None;
            return;
        };

        self.state.ticks_since_out_of_range = self.state.ticks_since_out_of_range.saturating_add(1);
        let ticks = self.state.ticks_since_out_of_range;
        if ticks >= self.config.keep_silent_ticks {
            let mut sound = sound.borrow_mut();
            if !sound.is_hard_stop_requested() {
                debug!(boss = sound.boss().name(), ticks, "boss_theme_hard_stop_requested");
            }
            sound.request_hard_stop_after_fade();
            sound.fade_to(0.0, fade_out_ticks);
        }
        if ticks >= self.config.release_after_ticks() {
            debug!(
                boss = self.state.current_boss.map(BossType::name),
                ticks, "boss_theme_released"
            );
            self.state.boss_sound = None;
            self.state.current_boss = None;
        }
    }

    fn start_theme(&mut self, boss: BossType, ctx: &mut ClientContext<'_>) -> bool {
        self.state.boss_sound = None;
        self.state.current_boss = None;

        let event = match resolve_theme(boss, ctx.sound_registry) {
            Ok(event) => event,
            Err(err) => {
                if self.reported_missing_themes.insert(boss) {
                    error!(boss = boss.name(), error = %err, "boss_theme_unavailable");
                } else {
                    debug!(boss = boss.name(), error = %err, "boss_theme_unavailable");
                }
                return false;
            }
        };

        let mut sound = BossThemeSound::new(boss, &event);
        sound.fade_to(1.0, self.config.fade_in_ticks);
        let sound = Rc::new(RefCell::new(sound));
        ctx.sounds.play(sound.clone());
        self.state.current_boss = Some(boss);
        self.state.boss_sound = Some(sound);
        true
    }

    fn boss_music_audible(&self) -> bool {
        match &self.state.boss_sound {
            Some(sound) => {
                self.state.was_in_range
                    || sound.borrow().volume() > self.config.audible_volume_threshold
            }
            None => false,
        }
    }

    fn apply_ambient_override(&mut self, mute: bool, services: &ServiceRegistry) {
        if mute {
            if !self.state.om_override_active {
                debug!("ambient_override_engaged");
            }
            self.bridge.mute_tick(services);
            self.state.om_override_active = true;
        } else if self.state.om_override_active {
            self.bridge.unmute_now(services);
            self.state.om_override_active = false;
            info!("ambient_override_released");
        }
    }
}

fn suppress_boss_mod_music(request: &SoundRequest) -> SoundDecision {
    if is_suppressed_boss_music(&request.location) {
        SoundDecision::Suppress
    } else {
        SoundDecision::Allow
    }
}

fn resolve_theme(boss: BossType, registry: &SoundRegistry) -> Result<SoundEvent, ThemeError> {
    let id = boss.theme_id()?;
    Ok(registry.get(&id)?.clone())
}

/// Nearest boss within the radius of `listener`. Equal distances keep the
/// entity that entered the world first.
pub fn find_boss_in_range(
    world: &ClientWorld,
    listener: &Entity,
    config: &ArbiterConfig,
) -> Option<BossType> {
    let bounds = listener.bounding_box().inflate(config.proximity_radius);
    let radius_sq = config.proximity_radius_sq();
    let mut nearest: Option<(BossType, f64)> = None;
    for entity in world.entities_within(&bounds, Some(listener.id)) {
        let Some(boss) = BossType::from_entity_type(&entity.type_id) else {
            continue;
        };
        let distance_sq = listener.distance_sq_to(entity);
        if distance_sq > radius_sq {
            continue;
        }
        if nearest.map_or(true, |(_, best)| distance_sq < best) {
            nearest = Some((boss, distance_sq));
        }
    }
    nearest.map(|(boss, _)| boss)
}

pub struct BossMusicHandler {
    controller: Rc<RefCell<ProximityMusicController>>,
}

impl BossMusicHandler {
    pub fn new(controller: Rc<RefCell<ProximityMusicController>>) -> Self {
        Self { controller }
    }
}

impl ClientHandler for BossMusicHandler {
    fn name(&self) -> &'static str {
        "boss_music"
    }

    fn on_client_tick(&mut self, event: &TickEvent, ctx: &mut ClientContext<'_>) {
        if event.phase != TickPhase::End {
            return;
        }
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => controller.on_tick(ctx),
            Err(_) => debug!(tick = event.tick, "boss_music_controller_busy"),
        }
    }

    fn on_play_sound(&mut self, request: &SoundRequest) -> SoundDecision {
        match self.controller.try_borrow() {
            Ok(controller) => controller.on_sound_request(request),
            Err(_) => suppress_boss_mod_music(request),
        }
    }

    fn on_shutdown(&mut self) {
        if let Ok(controller) = self.controller.try_borrow() {
            info!(
                boss = controller.current_boss().map(BossType::name),
                bridge = ?controller.bridge_status(),
                "boss_music_shutdown"
            );
        }
    }
}
