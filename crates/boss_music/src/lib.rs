use std::cell::RefCell;
use std::rc::Rc;

use engine::{Client, ResourceIdError, SoundEvent, SoundRegistry, SoundSource};
use tracing::info;

mod boss;
mod bridge;
mod config;
mod controller;
mod theme_sound;

pub use boss::{
    is_suppressed_boss_music, BossType, BOSS_MOD_NAMESPACE, SUPPRESSED_BOSS_MUSIC,
    THEME_NAMESPACE,
};
pub use bridge::{
    AmbientAudioBridge, AmbientMusicBackend, BridgeError, BridgeStatus, CapabilityProbe,
    DirectorProbe, InstanceError,
};
pub use config::{
    ArbiterConfig, ConfigError, AMBIENT_MUTE_FADE_TICKS, AMBIENT_RESTORE_FADE_TICKS,
    AUDIBLE_VOLUME_THRESHOLD, FADE_IN_TICKS, FADE_OUT_TICKS, KEEP_SILENT_TICKS, PROXIMITY_RADIUS,
    RELEASE_BUFFER_TICKS,
};
pub use controller::{
    find_boss_in_range, ArbitrationState, BossMusicHandler, ProximityMusicController, SharedTheme,
    ThemeError,
};
pub use theme_sound::BossThemeSound;

pub fn register_theme_sounds(registry: &mut SoundRegistry) -> Result<(), ResourceIdError> {
    for boss in BossType::ALL {
        registry.register(SoundEvent::new(boss.theme_id()?, SoundSource::Music));
    }
    Ok(())
}

pub fn install(
    client: &mut Client,
    config: ArbiterConfig,
) -> Result<Rc<RefCell<ProximityMusicController>>, ResourceIdError> {
    register_theme_sounds(client.sound_registry_mut())?;
    let bridge = AmbientAudioBridge::new(Box::new(DirectorProbe), &config);
    let controller = Rc::new(RefCell::new(ProximityMusicController::new(config, bridge)));
    client.add_handler(Box::new(BossMusicHandler::new(controller.clone())));
    info!(bosses = BossType::ALL.len(), "boss_music_installed");
    Ok(controller)
}
