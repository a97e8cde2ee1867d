use arena_assets::MeshLoader;
use arena_common::{EntityId, Light, Material, Pose, ShapeKind};
use arena_physics::{BodyDesc, PhysicsWorld, ShapeHandle};
use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::entity::Entity;
use crate::error::KernelError;
use crate::transform::build_transform;

/// Parameters for [`World::add_box`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxDesc {
    pub name: Option<String>,
    pub position: Vec3,
    /// Full dimensions along each axis.
    pub scale: Vec3,
    pub velocity: Vec3,
    /// Zero makes the box static.
    pub mass: f32,
    pub restitution: f32,
    pub material: String,
    pub rotation: Quat,
    pub hidden: bool,
}

impl Default for BoxDesc {
    fn default() -> Self {
        Self {
            name: None,
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            mass: 1.0,
            restitution: 0.5,
            material: "default".into(),
            rotation: Quat::IDENTITY,
            hidden: false,
        }
    }
}

/// Parameters for [`World::add_sphere`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereDesc {
    pub name: Option<String>,
    pub position: Vec3,
    pub radius: f32,
    pub velocity: Vec3,
    pub mass: f32,
    pub restitution: f32,
    pub material: String,
    pub light: bool,
    pub hidden: bool,
}

impl Default for SphereDesc {
    fn default() -> Self {
        Self {
            name: None,
            position: Vec3::ZERO,
            radius: 0.5,
            velocity: Vec3::ZERO,
            mass: 1.0,
            restitution: 0.5,
            material: "default".into(),
            light: false,
            hidden: false,
        }
    }
}

/// Parameters for [`World::add_mesh`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshDesc {
    pub name: Option<String>,
    pub path: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    pub restitution: f32,
    pub material: String,
    pub rotation: Quat,
    pub light: bool,
    pub hidden: bool,
}

impl Default for MeshDesc {
    fn default() -> Self {
        Self {
            name: None,
            path: String::new(),
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mass: 1.0,
            restitution: 0.5,
            material: "default".into(),
            rotation: Quat::IDENTITY,
            light: false,
            hidden: false,
        }
    }
}

/// Everything needed to finish an entity once its collision shape exists.
struct Seed {
    name: Option<String>,
    shape_kind: ShapeKind,
    shape: ShapeHandle,
    scale: Vec3,
    pose: Pose,
    velocity: Vec3,
    local_inertia: Vec3,
    mass: f32,
    restitution: f32,
    material: String,
    light: bool,
    hidden: bool,
}

/// The simulated scene: physics collaborator, ordered entity sequence,
/// material table and the two distinguished roles.
///
/// Entities are only ever appended. Insertion order is the render submission
/// order and the synchronization order.
#[derive(Debug)]
pub struct World<P> {
    physics: P,
    entities: Vec<Entity>,
    materials: BTreeMap<String, Material>,
    controlled: Option<EntityId>,
    emitter: Option<EntityId>,
}

impl<P: PhysicsWorld> World<P> {
    pub fn new(physics: P) -> Self {
        Self {
            physics,
            entities: Vec::new(),
            materials: BTreeMap::new(),
            controlled: None,
            emitter: None,
        }
    }

    pub fn with_materials(physics: P, materials: BTreeMap<String, Material>) -> Self {
        Self {
            materials,
            ..Self::new(physics)
        }
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    fn entity(&self, id: EntityId) -> Result<&Entity, KernelError> {
        self.get(id).ok_or(KernelError::UnknownEntity(id))
    }

    /// First entity created with `name`.
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|e| e.name() == Some(name))
            .map(Entity::id)
    }

    /// Light-emitting entities in insertion order.
    pub fn lights(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.light.is_some())
    }

    pub fn materials(&self) -> &BTreeMap<String, Material> {
        &self.materials
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn insert_material(&mut self, name: impl Into<String>, material: Material) {
        self.materials.insert(name.into(), material);
    }

    pub fn controlled(&self) -> Option<EntityId> {
        self.controlled
    }

    pub fn set_controlled(&mut self, id: EntityId) -> Result<(), KernelError> {
        self.entity(id)?;
        self.controlled = Some(id);
        Ok(())
    }

    pub fn emitter(&self) -> Option<EntityId> {
        self.emitter
    }

    pub fn set_emitter(&mut self, id: EntityId) -> Result<(), KernelError> {
        self.entity(id)?;
        self.emitter = Some(id);
        Ok(())
    }

    pub fn velocity(&self, id: EntityId) -> Result<Vec3, KernelError> {
        let body = self.entity(id)?.body;
        Ok(self.physics.linear_velocity(body)?)
    }

    /// Overwrite an entity's linear velocity directly on its body.
    pub fn set_velocity(&mut self, id: EntityId, velocity: Vec3) -> Result<(), KernelError> {
        let body = self.entity(id)?.body;
        self.physics.set_linear_velocity(body, velocity)?;
        Ok(())
    }

    pub fn set_angular_velocity(
        &mut self,
        id: EntityId,
        velocity: Vec3,
    ) -> Result<(), KernelError> {
        let body = self.entity(id)?.body;
        self.physics.set_angular_velocity(body, velocity)?;
        Ok(())
    }

    /// Add a box whose collision half extents are half of `desc.scale`.
    pub fn add_box(&mut self, desc: BoxDesc) -> Result<EntityId, KernelError> {
        let shape = self.physics.create_box_shape(desc.scale / 2.0)?;
        // The initial velocity doubles as the inertia scratch vector.
        let local_inertia = if desc.mass == 0.0 {
            Vec3::ZERO
        } else {
            let mut inertia = desc.velocity;
            self.physics
                .compute_local_inertia(shape, desc.mass, &mut inertia)?;
            inertia
        };
        self.insert(Seed {
            name: desc.name,
            shape_kind: ShapeKind::Box,
            shape,
            scale: desc.scale,
            pose: Pose::new(desc.position, desc.rotation),
            velocity: desc.velocity,
            local_inertia,
            mass: desc.mass,
            restitution: desc.restitution,
            material: desc.material,
            light: false,
            hidden: desc.hidden,
        })
    }

    /// Add a sphere, rendered with a uniform scale of `desc.radius`.
    pub fn add_sphere(&mut self, desc: SphereDesc) -> Result<EntityId, KernelError> {
        let shape = self.physics.create_sphere_shape(desc.radius)?;
        let mut inertia = desc.velocity;
        self.physics
            .compute_local_inertia(shape, desc.mass, &mut inertia)?;
        self.insert(Seed {
            name: desc.name,
            shape_kind: ShapeKind::Sphere,
            shape,
            scale: Vec3::splat(desc.radius),
            pose: Pose::from_position(desc.position),
            velocity: desc.velocity,
            local_inertia: inertia,
            mass: desc.mass,
            restitution: desc.restitution,
            material: desc.material,
            light: desc.light,
            hidden: desc.hidden,
        })
    }

    /// Add a convex body built from a mesh resolved by `loader`.
    ///
    /// A load failure surfaces as [`KernelError::AssetLoad`] before anything
    /// is registered with the physics world.
    pub fn add_mesh<L>(&mut self, loader: &L, desc: MeshDesc) -> Result<EntityId, KernelError>
    where
        L: MeshLoader + ?Sized,
    {
        let mesh = loader.load(Path::new(&desc.path))?;
        let shape = self
            .physics
            .create_convex_shape_from_triangles(&mesh.vertices, &mesh.faces)?;
        let mut inertia = desc.velocity;
        self.physics
            .compute_local_inertia(shape, desc.mass, &mut inertia)?;
        self.insert(Seed {
            name: desc.name,
            shape_kind: ShapeKind::Mesh { path: desc.path },
            shape,
            scale: Vec3::ONE,
            pose: Pose::new(desc.position, desc.rotation),
            velocity: desc.velocity,
            local_inertia: inertia,
            mass: desc.mass,
            restitution: desc.restitution,
            material: desc.material,
            light: desc.light,
            hidden: desc.hidden,
        })
    }

    fn insert(&mut self, seed: Seed) -> Result<EntityId, KernelError> {
        let body = self.physics.create_body(BodyDesc {
            shape: seed.shape,
            mass: seed.mass,
            pose: seed.pose,
            local_inertia: seed.local_inertia,
            restitution: seed.restitution,
        })?;
        let pose = match self
            .physics
            .add_body(body)
            .and_then(|()| self.physics.pose(body))
        {
            Ok(pose) => pose,
            Err(e) => {
                // The shape stays in the physics arena; only the body is unwound.
                if let Err(cleanup) = self.physics.remove_body(body) {
                    tracing::warn!(?body, error = %cleanup, "could not remove orphaned body");
                }
                return Err(e.into());
            }
        };

        let light = seed.light.then(|| {
            let material = self.materials.get(&seed.material).copied().unwrap_or_else(|| {
                tracing::warn!(material = %seed.material, "light uses unknown material, defaulting");
                Material::default()
            });
            Light::from_material(&material)
        });

        let id = EntityId(self.entities.len() as u32);
        tracing::debug!(
            ?id,
            shape = seed.shape_kind.label(),
            mass = seed.mass,
            position = %pose.position,
            "added entity"
        );
        self.entities.push(Entity {
            id,
            name: seed.name,
            shape: seed.shape_kind,
            scale: seed.scale,
            transform: build_transform(&pose, seed.scale),
            pose,
            body,
            material: seed.material,
            hidden: seed.hidden,
            light,
            initial_velocity: seed.velocity,
            mass: seed.mass,
            restitution: seed.restitution,
        });
        Ok(id)
    }

    /// Spheres with random placement and physical parameters. The first four
    /// are white lights, the rest red.
    pub fn randomly_init_spheres<R: Rng + ?Sized>(
        &mut self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<EntityId>, KernelError> {
        let mut ids = Vec::with_capacity(n);
        for i in 0..n {
            let position = random_position(rng);
            let radius = 0.5 * unit(rng);
            let velocity = random_velocity(rng);
            let mass = unit(rng);
            let restitution = unit(rng);
            let (material, light) = if i < 4 {
                ("white", true)
            } else {
                ("redambient", false)
            };
            ids.push(self.add_sphere(SphereDesc {
                position,
                radius,
                velocity,
                mass,
                restitution,
                material: material.into(),
                light,
                ..SphereDesc::default()
            })?);
        }
        Ok(ids)
    }

    /// Boxes with random placement, dimensions, parameters and orientation.
    pub fn randomly_init_boxes<R: Rng + ?Sized>(
        &mut self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<EntityId>, KernelError> {
        let mut ids = Vec::with_capacity(n);
        for _ in 0..n {
            let position = random_position(rng);
            let scale = Vec3::new(0.5 * unit(rng), 0.5 * unit(rng), 0.5 * unit(rng));
            let velocity = random_velocity(rng);
            let mass = unit(rng);
            let restitution = unit(rng);
            let rotation = random_rotation(rng);
            ids.push(self.add_box(BoxDesc {
                position,
                scale,
                velocity,
                mass,
                restitution,
                material: "blueambient".into(),
                rotation,
                ..BoxDesc::default()
            })?);
        }
        Ok(ids)
    }

    /// Mirror every body's pose from the physics world and rebuild the
    /// render transforms. Nothing is written unless every read succeeds.
    pub fn sync_transforms(&mut self) -> Result<(), KernelError> {
        let poses = self
            .entities
            .iter()
            .map(|e| self.physics.pose(e.body))
            .collect::<Result<Vec<_>, _>>()?;
        for (entity, pose) in self.entities.iter_mut().zip(poses) {
            entity.pose = pose;
            entity.transform = build_transform(&pose, entity.scale);
        }
        Ok(())
    }

    /// FNV-1a hash over every entity's pose and scale, in insertion order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |bytes: &[u8]| {
            for &b in bytes {
                h ^= b as u64;
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&(self.entities.len() as u64).to_le_bytes());
        for e in &self.entities {
            let p = e.pose.position;
            let q = e.pose.orientation;
            for f in [p.x, p.y, p.z, q.x, q.y, q.z, q.w, e.scale.x, e.scale.y, e.scale.z] {
                mix(&f.to_le_bytes());
            }
        }
        h
    }
}

fn unit<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(0.0..1.0)
}

/// Uniform in [-5, 5] x [0, 10] x [-5, 5].
fn random_position<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3::new(
        unit(rng) * 10.0 - 5.0,
        unit(rng) * 10.0,
        unit(rng) * 10.0 - 5.0,
    )
}

fn random_velocity<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3::new(unit(rng) * 0.1, unit(rng) * 0.1, unit(rng) * 0.1)
}

/// Random unit quaternion by rejection sampling inside the unit 4-ball.
fn random_rotation<R: Rng + ?Sized>(rng: &mut R) -> Quat {
    loop {
        let q = Quat::from_xyzw(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len_sq = q.length_squared();
        if len_sq > 1e-4 && len_sq <= 1.0 {
            return q.normalize();
        }
    }
}
