use arena_common::EntityId;
use arena_physics::PhysicsWorld;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::world::{SphereDesc, World};

/// Where projectiles appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnOrigin {
    /// `offset` is a world-space position.
    #[default]
    Fixed,
    /// `offset` is relative to the emitter's current position.
    Emitter,
}

/// Projectile spawn settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Fire on every tick that is a non-zero multiple of this. Zero disables spawning.
    pub interval_ticks: u64,
    pub origin: SpawnOrigin,
    pub offset: Vec3,
    pub radius: f32,
    pub mass: f32,
    pub restitution: f32,
    pub material: String,
    /// Multiplier applied to the randomized launch direction.
    pub speed_scale: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            interval_ticks: 2,
            origin: SpawnOrigin::Fixed,
            offset: Vec3::new(0.0, 6.0, -10.0),
            radius: 0.6,
            mass: 0.1,
            restitution: 0.1,
            material: "blueambient".into(),
            speed_scale: -4.0,
        }
    }
}

/// Randomized launch velocity: `(±rx, ±ry, -1) * scale` with `rx, ry` in
/// [0, 1) and each sign flipped with probability one half.
pub fn launch_velocity<R: Rng + ?Sized>(rng: &mut R, scale: f32) -> Vec3 {
    let sign_x = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
    let sign_y = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
    let x: f32 = rng.gen_range(0.0..1.0);
    let y: f32 = rng.gen_range(0.0..1.0);
    Vec3::new(x * sign_x, y * sign_y, -1.0) * scale
}

/// Periodic projectile spawner gated on tick boundaries.
///
/// A latch guarantees exactly one spawn per qualifying boundary no matter
/// how many frames land on it; it resets as soon as the tick leaves the
/// boundary.
#[derive(Debug, Clone, Default)]
pub struct SpawnTrigger {
    config: SpawnConfig,
    latched: bool,
    fired: u64,
}

impl SpawnTrigger {
    pub fn new(config: SpawnConfig) -> Self {
        Self {
            config,
            latched: false,
            fired: 0,
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Number of projectiles spawned so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    fn on_boundary(&self, tick: u64) -> bool {
        tick != 0
            && tick
                .checked_rem(self.config.interval_ticks)
                .is_some_and(|r| r == 0)
    }

    /// Advance the latch for `tick`. True exactly once per boundary.
    pub fn should_fire(&mut self, tick: u64) -> bool {
        if !self.on_boundary(tick) {
            self.latched = false;
            return false;
        }
        if self.latched {
            return false;
        }
        self.latched = true;
        true
    }

    /// Spawn a projectile when `tick` opens a new boundary and launch it.
    ///
    /// If launching fails the projectile stays in the world, counted in
    /// [`fired`](Self::fired), and the boundary is not retried.
    pub fn evaluate<P, R>(
        &mut self,
        world: &mut World<P>,
        tick: u64,
        rng: &mut R,
    ) -> Result<Option<EntityId>, KernelError>
    where
        P: PhysicsWorld,
        R: Rng + ?Sized,
    {
        if !self.should_fire(tick) {
            return Ok(None);
        }

        let position = match (self.config.origin, world.emitter()) {
            (SpawnOrigin::Fixed, _) => self.config.offset,
            (SpawnOrigin::Emitter, Some(emitter)) => world
                .get(emitter)
                .map(|e| e.pose().position + self.config.offset)
                .ok_or(KernelError::UnknownEntity(emitter))?,
            (SpawnOrigin::Emitter, None) => {
                tracing::warn!("emitter-relative spawn without an emitter, using offset as position");
                self.config.offset
            }
        };

        let id = world.add_sphere(SphereDesc {
            position,
            radius: self.config.radius,
            mass: self.config.mass,
            restitution: self.config.restitution,
            material: self.config.material.clone(),
            ..SphereDesc::default()
        })?;
        // Counted once the entity exists; a failed launch leaves it at rest.
        self.fired += 1;
        let velocity = launch_velocity(rng, self.config.speed_scale);
        world.set_velocity(id, velocity)?;
        tracing::info!(?id, tick, %position, %velocity, "spawned projectile");
        Ok(Some(id))
    }
}
