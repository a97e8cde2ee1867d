use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Identifier for an entity in a world's entity sequence.
///
/// Ids are assigned in insertion order and never reused; entities are not
/// removed for the lifetime of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Placement of a body in world space: position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Unit-length orientation. A degenerate (near zero) quaternion maps to
    /// identity instead of producing NaNs.
    pub fn unit_orientation(&self) -> Quat {
        let len_sq = self.orientation.length_squared();
        if len_sq <= f32::EPSILON || !len_sq.is_finite() {
            Quat::IDENTITY
        } else {
            self.orientation / len_sq.sqrt()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite()
    }
}

/// Phong-style material: ambient and diffuse reflectance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub ka: Vec3,
    #[serde(default = "default_diffuse")]
    pub kd: Vec3,
}

fn default_diffuse() -> Vec3 {
    Vec3::ONE
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ka: Vec3::splat(0.2),
            kd: default_diffuse(),
        }
    }
}

impl Material {
    pub fn new(ka: Vec3, kd: Vec3) -> Self {
        Self { ka, kd }
    }
}

/// Render shape of an entity. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    Box,
    Sphere,
    Mesh { path: String },
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Mesh { .. } => "mesh",
        }
    }
}

/// Point light parameters attached to an emissive entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub color: Vec3,
    /// Constant, linear and quadratic falloff coefficients.
    pub attenuation: Vec3,
}

impl Light {
    /// No-falloff light colored by the material's diffuse reflectance.
    pub fn from_material(material: &Material) -> Self {
        Self {
            color: material.kd,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
        }
    }
}

/// Camera placement handed to the renderer each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fovy: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.5, 5.0),
            rotation: Quat::IDENTITY,
            fovy: 1.0,
        }
    }
}
