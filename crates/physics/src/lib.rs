//! Physics collaborator: the interface the world drives each frame, plus a
//! deterministic kinematic backend.
//!
//! # Invariants
//! - Bodies and shapes are referenced by opaque arena handles owned by the backend.
//! - `step` either completes for every body or leaves all body state untouched.
//! - Poses read back after a step have unit-length orientation.

mod contact;
mod kinematic;
mod shape;

pub use kinematic::{KinematicConfig, KinematicPhysics};
pub use shape::Shape;

use arena_common::Pose;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Opaque handle to a collision shape owned by a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeHandle(pub u32);

/// Opaque handle to a rigid body owned by a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Construction parameters for a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: ShapeHandle,
    /// Zero mass makes the body static.
    pub mass: f32,
    pub pose: Pose,
    pub local_inertia: Vec3,
    pub restitution: f32,
}

/// Errors surfaced by a physics backend.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// Internal failure while stepping; the frame must be abandoned.
    #[error("physics step fault: {reason}")]
    StepFault { reason: String },
    #[error("unknown body {0:?}")]
    UnknownBody(BodyHandle),
    #[error("unknown shape {0:?}")]
    UnknownShape(ShapeHandle),
    #[error("degenerate shape: {0}")]
    DegenerateShape(String),
}

/// The physics world collaborator.
///
/// Integration, collision and constraint solving live entirely behind this
/// trait. Callers only create shapes and bodies, step, read poses back and
/// override velocities.
pub trait PhysicsWorld {
    fn create_box_shape(&mut self, half_extents: Vec3) -> Result<ShapeHandle, PhysicsError>;

    fn create_sphere_shape(&mut self, radius: f32) -> Result<ShapeHandle, PhysicsError>;

    /// Convex shape enclosing a triangle soup. `faces` index into `vertices`.
    fn create_convex_shape_from_triangles(
        &mut self,
        vertices: &[Vec3],
        faces: &[[u32; 3]],
    ) -> Result<ShapeHandle, PhysicsError>;

    /// Diagonal local inertia for `shape` at `mass`, written into `inertia`.
    ///
    /// `inertia` is scratch space: whatever it holds on entry is overwritten.
    fn compute_local_inertia(
        &self,
        shape: ShapeHandle,
        mass: f32,
        inertia: &mut Vec3,
    ) -> Result<(), PhysicsError>;

    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError>;

    /// Insert a created body into the simulation.
    fn add_body(&mut self, body: BodyHandle) -> Result<(), PhysicsError>;

    /// Take a body out of the simulation. Used to unwind a half-built entity.
    fn remove_body(&mut self, body: BodyHandle) -> Result<(), PhysicsError>;

    /// Advance the simulation by `dt` seconds using at most `substeps` fixed steps.
    fn step(&mut self, dt: f32, substeps: u32) -> Result<(), PhysicsError>;

    fn pose(&self, body: BodyHandle) -> Result<Pose, PhysicsError>;

    fn linear_velocity(&self, body: BodyHandle) -> Result<Vec3, PhysicsError>;

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3)
    -> Result<(), PhysicsError>;

    fn set_angular_velocity(
        &mut self,
        body: BodyHandle,
        velocity: Vec3,
    ) -> Result<(), PhysicsError>;
}

pub fn crate_info() -> &'static str {
    "arena-physics v0.1.0"
}
