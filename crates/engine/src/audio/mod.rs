mod manager;
mod registry;
mod sound;

pub use manager::SoundManager;
pub use registry::{SoundLookupError, SoundRegistry};
pub use sound::{
    SharedSound, SoundDecision, SoundEvent, SoundRequest, SoundSource, TickableSound,
};
