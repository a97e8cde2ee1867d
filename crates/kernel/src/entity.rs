use arena_common::{EntityId, Light, Pose, ShapeKind};
use arena_physics::BodyHandle;
use glam::{Mat4, Vec3};

/// A simulated object: physics body handle, mirrored pose, derived render
/// transform and render metadata.
///
/// Only the owning [`World`](crate::World) writes `pose` and `transform`;
/// everything else is fixed at creation.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) name: Option<String>,
    pub(crate) shape: ShapeKind,
    pub(crate) scale: Vec3,
    pub(crate) pose: Pose,
    pub(crate) transform: Mat4,
    pub(crate) body: BodyHandle,
    pub(crate) material: String,
    pub(crate) hidden: bool,
    pub(crate) light: Option<Light>,
    pub(crate) initial_velocity: Vec3,
    pub(crate) mass: f32,
    pub(crate) restitution: f32,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn shape(&self) -> &ShapeKind {
        &self.shape
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Pose as of the last synchronization with the physics world.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    /// Hidden entities are simulated and synchronized but never submitted
    /// for rendering.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn light(&self) -> Option<&Light> {
        self.light.as_ref()
    }

    /// Velocity the entity was created with. Stored for reference only.
    pub fn initial_velocity(&self) -> Vec3 {
        self.initial_velocity
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn is_static(&self) -> bool {
        self.mass == 0.0
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }
}
