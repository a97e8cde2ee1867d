use arena_assets::MeshLoader;
use arena_common::{CameraPose, EntityId, Material};
use arena_physics::{KinematicConfig, PhysicsWorld};
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::KernelError;
use crate::frame::FrameConfig;
use crate::world::{BoxDesc, MeshDesc, SphereDesc, World};

/// Counts for the random bulk generators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomPopulation {
    pub spheres: usize,
    pub boxes: usize,
}

/// Entity names that take the two distinguished roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roles {
    pub controlled: Option<String>,
    pub emitter: Option<String>,
}

/// A scene description loaded from YAML.
///
/// Entities are created in a fixed order: boxes, spheres, meshes, then the
/// random spheres and boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub materials: BTreeMap<String, Material>,
    pub camera: CameraPose,
    pub physics: KinematicConfig,
    pub frame: FrameConfig,
    pub random: RandomPopulation,
    pub boxes: Vec<BoxDesc>,
    pub spheres: Vec<SphereDesc>,
    pub meshes: Vec<MeshDesc>,
    pub roles: Roles,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let materials = [
            ("redambient", Vec3::new(0.7, 0.0, 0.0), Vec3::ONE),
            ("blueambient", Vec3::new(0.0, 0.0, 0.7), Vec3::ONE),
            ("green", Vec3::new(0.0, 0.7, 0.0), Vec3::ONE),
            ("white", Vec3::ONE, Vec3::ONE),
            ("ground", Vec3::splat(0.2), Vec3::ONE),
        ]
        .into_iter()
        .map(|(name, ka, kd)| (name.to_string(), Material::new(ka, kd)))
        .collect();

        Self {
            materials,
            camera: CameraPose::default(),
            physics: KinematicConfig::default(),
            frame: FrameConfig::default(),
            random: RandomPopulation::default(),
            boxes: Vec::new(),
            spheres: Vec::new(),
            meshes: Vec::new(),
            roles: Roles::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, KernelError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, KernelError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.as_ref().display(), "loaded scene config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, KernelError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create a world backed by `physics` and populate it from this scene.
    pub fn build_world<P, L, R>(
        &self,
        physics: P,
        loader: &L,
        rng: &mut R,
    ) -> Result<World<P>, KernelError>
    where
        P: PhysicsWorld,
        L: MeshLoader + ?Sized,
        R: Rng + ?Sized,
    {
        let mut world = World::with_materials(physics, self.materials.clone());
        self.populate(&mut world, loader, rng)?;
        Ok(world)
    }

    /// Add this scene's entities to `world` and assign roles.
    pub fn populate<P, L, R>(
        &self,
        world: &mut World<P>,
        loader: &L,
        rng: &mut R,
    ) -> Result<(), KernelError>
    where
        P: PhysicsWorld,
        L: MeshLoader + ?Sized,
        R: Rng + ?Sized,
    {
        for desc in &self.boxes {
            world.add_box(desc.clone())?;
        }
        for desc in &self.spheres {
            world.add_sphere(desc.clone())?;
        }
        for desc in &self.meshes {
            world.add_mesh(loader, desc.clone())?;
        }
        world.randomly_init_spheres(self.random.spheres, rng)?;
        world.randomly_init_boxes(self.random.boxes, rng)?;

        if let Some(name) = &self.roles.controlled {
            let id = resolve_role(world, "controlled", name)?;
            world.set_controlled(id)?;
        }
        if let Some(name) = &self.roles.emitter {
            let id = resolve_role(world, "emitter", name)?;
            world.set_emitter(id)?;
        }

        tracing::info!(
            entities = world.entity_count(),
            lights = world.lights().count(),
            "scene populated"
        );
        Ok(())
    }
}

fn resolve_role<P: PhysicsWorld>(
    world: &World<P>,
    role: &str,
    name: &str,
) -> Result<EntityId, KernelError> {
    world
        .find(name)
        .ok_or_else(|| KernelError::Config(format!("{role} role names unknown entity '{name}'")))
}
