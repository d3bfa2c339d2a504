use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ambient_music::{AmbientTrack, MusicDirector};
use boss_music::{BossType, ProximityMusicController, BOSS_MOD_NAMESPACE};
use engine::{
    Client, ClientContext, ClientHandler, EntityId, ResourceId, ResourceIdError, SoundSource,
    TickEvent, TickPhase, TickableSound, Vec3,
};
use tracing::{info, warn};

const LISTENER_HALF_EXTENTS: Vec3 = Vec3::new(0.3, 0.9, 0.3);
const BOSS_HALF_EXTENTS: Vec3 = Vec3::new(1.5, 2.0, 1.5);
const STATUS_INTERVAL_TICKS: u64 = 100;
const NATIVE_TRACK_TICKS: u32 = 400;
const AMBIENT_TRACK_TICKS: u64 = 6_000;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StepAction {
    Spawn { boss: BossType, position: Vec3 },
    MoveTo { boss: BossType, position: Vec3 },
    Despawn { boss: BossType },
    PlayNative { path: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScenarioStep {
    pub(crate) at_tick: u64,
    pub(crate) action: StepAction,
}

fn step(at_tick: u64, action: StepAction) -> ScenarioStep {
    ScenarioStep { at_tick, action }
}

pub(crate) fn default_script() -> Vec<ScenarioStep> {
    vec![
        step(
            0,
            StepAction::Spawn {
                boss: BossType::Frostmaw,
                position: Vec3::new(60.0, 0.0, 0.0),
            },
        ),
        step(
            100,
            StepAction::MoveTo {
                boss: BossType::Frostmaw,
                position: Vec3::new(20.0, 0.0, 0.0),
            },
        ),
        step(
            200,
            StepAction::PlayNative {
                path: "music.frostmaw_theme",
            },
        ),
        step(
            300,
            StepAction::Spawn {
                boss: BossType::Umvuthi,
                position: Vec3::new(8.0, 0.0, 4.0),
            },
        ),
        step(
            500,
            StepAction::Despawn {
                boss: BossType::Umvuthi,
            },
        ),
        step(
            700,
            StepAction::MoveTo {
                boss: BossType::Frostmaw,
                position: Vec3::new(200.0, 0.0, 0.0),
            },
        ),
    ]
}

pub(crate) fn ambient_playlist() -> Result<Vec<AmbientTrack>, ResourceIdError> {
    Ok(vec![
        AmbientTrack {
            id: ResourceId::new("ambient", "overworld_day")?,
            length_ticks: AMBIENT_TRACK_TICKS,
        },
        AmbientTrack {
            id: ResourceId::new("ambient", "overworld_night")?,
            length_ticks: AMBIENT_TRACK_TICKS,
        },
    ])
}

pub(crate) fn install(
    client: &mut Client,
    script: Vec<ScenarioStep>,
    controller: Rc<RefCell<ProximityMusicController>>,
    director: Rc<RefCell<MusicDirector>>,
) -> Result<EntityId, ResourceIdError> {
    let listener = client.world_mut().spawn(
        ResourceId::new("minecraft", "player")?,
        Vec3::ZERO,
        LISTENER_HALF_EXTENTS,
    );
    client.set_listener(Some(listener));
    client.add_handler(Box::new(ScenarioHandler::new(script, controller, director)));
    info!(listener = listener.0, "scenario_installed");
    Ok(listener)
}

struct ScenarioHandler {
    script: Vec<ScenarioStep>,
    next_step: usize,
    bosses: HashMap<BossType, EntityId>,
    controller: Rc<RefCell<ProximityMusicController>>,
    director: Rc<RefCell<MusicDirector>>,
}

impl ScenarioHandler {
    fn new(
        mut script: Vec<ScenarioStep>,
        controller: Rc<RefCell<ProximityMusicController>>,
        director: Rc<RefCell<MusicDirector>>,
    ) -> Self {
        script.sort_by_key(|step| step.at_tick);
        Self {
            script,
            next_step: 0,
            bosses: HashMap::new(),
            controller,
            director,
        }
    }

    fn run_due_steps(&mut self, tick: u64, ctx: &mut ClientContext<'_>) {
        while let Some(step) = self.script.get(self.next_step) {
            if step.at_tick > tick {
                break;
            }
            let action = step.action.clone();
            self.next_step += 1;
            if let Err(err) = self.apply(&action, ctx) {
                warn!(tick, action = ?action, error = %err, "scenario_step_failed");
            }
        }
    }

    fn apply(
        &mut self,
        action: &StepAction,
        ctx: &mut ClientContext<'_>,
    ) -> Result<(), ResourceIdError> {
        match action {
            StepAction::Spawn { boss, position } => {
                let id = ctx
                    .world
                    .spawn(boss.entity_id()?, *position, BOSS_HALF_EXTENTS);
                self.bosses.insert(*boss, id);
                info!(boss = boss.name(), x = position.x, z = position.z, "scenario_boss_spawned");
            }
            StepAction::MoveTo { boss, position } => {
                let moved = self
                    .bosses
                    .get(boss)
                    .is_some_and(|id| ctx.world.set_position(*id, *position));
                info!(boss = boss.name(), x = position.x, z = position.z, moved, "scenario_boss_moved");
            }
            StepAction::Despawn { boss } => {
                let removed = self
                    .bosses
                    .remove(boss)
                    .is_some_and(|id| ctx.world.despawn(id));
                info!(boss = boss.name(), removed, "scenario_boss_despawned");
            }
            StepAction::PlayNative { path } => {
                let location = ResourceId::new(BOSS_MOD_NAMESPACE, path)?;
                info!(sound = %location, "scenario_native_music_requested");
                ctx.sounds
                    .play(Rc::new(RefCell::new(NativeTrack::new(location))));
            }
        }
        Ok(())
    }

    fn report(&self, tick: u64) {
        let (Ok(controller), Ok(director)) =
            (self.controller.try_borrow(), self.director.try_borrow())
        else {
            return;
        };
        info!(
            tick,
            boss = controller.current_boss().map(BossType::name),
            boss_volume = controller.boss_volume(),
            ambient_track = director.current().map(ToString::to_string),
            ambient_volume = director.current_volume(),
            ambient_muted = controller.state().om_override_active(),
            "scenario_status"
        );
    }
}

impl ClientHandler for ScenarioHandler {
    fn name(&self) -> &'static str {
        "scenario"
    }

    fn on_client_tick(&mut self, event: &TickEvent, ctx: &mut ClientContext<'_>) {
        match event.phase {
            TickPhase::Start => self.run_due_steps(event.tick, ctx),
            TickPhase::End => {
                if event.tick % STATUS_INTERVAL_TICKS == 0 {
                    self.report(event.tick);
                }
            }
        }
    }
}

struct NativeTrack {
    location: ResourceId,
    remaining_ticks: u32,
}

impl NativeTrack {
    fn new(location: ResourceId) -> Self {
        Self {
            location,
            remaining_ticks: NATIVE_TRACK_TICKS,
        }
    }
}

impl TickableSound for NativeTrack {
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
        self.remaining_ticks == 0
    }

    fn tick(&mut self) {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
    }
}
