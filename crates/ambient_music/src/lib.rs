use std::cell::RefCell;
use std::rc::Rc;

use engine::{Client, SoundEvent, SoundSource};
use tracing::info;

mod director;
mod instance;

pub use director::{
    AmbientMusicHandler, AmbientTrack, MusicDirector, SharedInstance, INACTIVE_CLEANUP_TICKS,
    TRACK_FADE_TICKS,
};
pub use instance::FadingMusicInstance;

pub const DIRECTOR_SERVICE: &str = "ambient_music:director";
pub const DIRECTOR_LAYOUT_VERSION: u32 = 2;

pub fn install(client: &mut Client, playlist: Vec<AmbientTrack>) -> Rc<RefCell<MusicDirector>> {
    for track in &playlist {
        client
            .sound_registry_mut()
            .register(SoundEvent::new(track.id.clone(), SoundSource::Music));
    }
    let track_count = playlist.len();
    let director = Rc::new(RefCell::new(MusicDirector::new(playlist)));
    client
        .services_mut()
        .publish(DIRECTOR_SERVICE, DIRECTOR_LAYOUT_VERSION, director.clone());
    client.add_handler(Box::new(AmbientMusicHandler::new(director.clone())));
    info!(tracks = track_count, "ambient_music_installed");
    director
}
