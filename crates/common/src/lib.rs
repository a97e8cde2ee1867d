//! Shared value types for the particle arena.

mod types;

pub use types::{CameraPose, EntityId, Light, Material, Pose, ShapeKind};
