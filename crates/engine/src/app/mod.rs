mod client;
mod loop_runner;
mod metrics;
mod world;

pub use client::{Client, ClientContext, ClientHandler, TickEvent, TickPhase};
pub use loop_runner::{run_client, run_client_with_metrics, AppError, LoopConfig, RunSummary};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use world::{Aabb, ClientWorld, Entity, EntityId, Vec3};
