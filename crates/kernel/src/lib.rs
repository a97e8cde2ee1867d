//! Arena Kernel: entity model, transform sync, frame orchestration and the
//! discrete control and spawn rules.
//!
//! # Invariants
//! - An entity's transform is always `T(position) * R(orientation) * S(scale)`
//!   of the pose last read back from physics.
//! - Read-back happens only after a physics step has completed, and a failed
//!   step leaves every entity untouched.
//! - Entities are append-only; insertion order is render and sync order.
//! - At most one projectile spawns per tick boundary.

pub mod clock;
pub mod config;
pub mod control;
pub mod entity;
pub mod error;
pub mod frame;
pub mod spawn;
pub mod transform;
pub mod world;

pub use clock::{FixedStepTimeSource, FrameClock, ManualTimeSource, SystemTimeSource, TimeSource};
pub use config::{RandomPopulation, Roles, SceneConfig};
pub use control::ControlRules;
pub use entity::Entity;
pub use error::KernelError;
pub use frame::{FrameConfig, FrameOrchestrator, FrameReport};
pub use spawn::{launch_velocity, SpawnConfig, SpawnOrigin, SpawnTrigger};
pub use transform::build_transform;
pub use world::{BoxDesc, MeshDesc, SphereDesc, World};

pub fn crate_info() -> &'static str {
    "arena-kernel v0.1.0"
}
