use arena_common::{CameraPose, EntityId};
use arena_input::InputState;
use arena_physics::PhysicsWorld;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::{FrameClock, TimeSource};
use crate::control::ControlRules;
use crate::error::KernelError;
use crate::spawn::{SpawnConfig, SpawnTrigger};
use crate::world::World;

/// Orchestrator tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Maximum physics substeps per frame.
    pub substeps: u32,
    /// Length of one tick in seconds.
    pub tick_seconds: f64,
    /// Camera position re-applied every frame.
    pub framing: Vec3,
    pub control: ControlRules,
    pub spawn: SpawnConfig,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            substeps: 10,
            tick_seconds: 1.0,
            framing: Vec3::new(0.0, 2.0, 5.0),
            control: ControlRules::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

/// What happened during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub dt: f32,
    pub elapsed: f64,
    pub tick: u64,
    pub spawned: Option<EntityId>,
    /// Velocity written to the controlled entity, if any.
    pub control: Option<Vec3>,
    /// The emitter has been knocked into motion.
    pub emitter_moving: bool,
}

/// Per-frame driver.
///
/// Each [`step`](Self::step) runs, in order: clock advance, physics step,
/// pose read-back for every entity, spawn trigger, control override, camera
/// framing. Read-back never starts before the step has finished, and a failed
/// step abandons the frame before any entity is touched.
#[derive(Debug)]
pub struct FrameOrchestrator<T> {
    clock: FrameClock<T>,
    spawn: SpawnTrigger,
    control: ControlRules,
    substeps: u32,
    framing: Vec3,
    camera: CameraPose,
    frame: u64,
}

impl<T: TimeSource> FrameOrchestrator<T> {
    pub fn new(source: T, config: FrameConfig) -> Self {
        Self {
            clock: FrameClock::with_tick_seconds(source, config.tick_seconds),
            spawn: SpawnTrigger::new(config.spawn),
            control: config.control,
            substeps: config.substeps,
            framing: config.framing,
            camera: CameraPose::default(),
            frame: 0,
        }
    }

    pub fn with_camera(mut self, camera: CameraPose) -> Self {
        self.camera = camera;
        self
    }

    pub fn clock(&self) -> &FrameClock<T> {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock<T> {
        &mut self.clock
    }

    pub fn spawn_trigger(&self) -> &SpawnTrigger {
        &self.spawn
    }

    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run one frame against `world` with this frame's input snapshot.
    pub fn step<P, R>(
        &mut self,
        world: &mut World<P>,
        input: &InputState,
        rng: &mut R,
    ) -> Result<FrameReport, KernelError>
    where
        P: PhysicsWorld,
        R: Rng + ?Sized,
    {
        let _span = tracing::info_span!("frame", frame = self.frame).entered();

        let dt = self.clock.advance();
        if let Err(e) = world.physics_mut().step(dt, self.substeps) {
            tracing::error!(error = %e, dt, "physics step failed, abandoning frame");
            return Err(e.into());
        }
        world.sync_transforms()?;

        let tick = self.clock.tick();
        let spawned = self.spawn.evaluate(world, tick, rng)?;
        let control = self.control.apply(world, input)?;
        self.camera.position = self.framing;

        let emitter_moving = match world.emitter() {
            Some(id) => world.velocity(id)? != Vec3::ZERO,
            None => false,
        };

        let report = FrameReport {
            frame: self.frame,
            dt,
            elapsed: self.clock.elapsed(),
            tick,
            spawned,
            control,
            emitter_moving,
        };
        self.frame += 1;
        tracing::trace!(?report, "frame done");
        Ok(report)
    }
}
