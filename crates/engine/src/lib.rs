pub mod app;
pub mod audio;
mod resource;
mod services;

pub use app::{
    run_client, run_client_with_metrics, Aabb, AppError, Client, ClientContext, ClientHandler,
    ClientWorld, Entity, EntityId, LoopConfig, LoopMetricsSnapshot, MetricsHandle, RunSummary,
    TickEvent, TickPhase, Vec3,
};
pub use audio::{
    SharedSound, SoundDecision, SoundEvent, SoundLookupError, SoundManager, SoundRegistry,
    SoundRequest, SoundSource, TickableSound,
};
pub use resource::{ResourceId, ResourceIdError};
pub use services::{ServiceEntry, ServiceRegistry};
