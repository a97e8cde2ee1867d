use arena_input::{InputState, Key};
use arena_physics::PhysicsWorld;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::world::World;

/// Key-driven velocity override for the controlled entity.
///
/// The override is written straight into the body's linear velocity,
/// bypassing force integration. Rules are applied in a fixed order and
/// later rules win:
///
/// | keys           | x      | y        |
/// |----------------|--------|----------|
/// | none           | 0      | 0 (z too)|
/// | Forward        | 0      | +speed   |
/// | Back           | 0      | -speed   |
/// | Right          | +speed | 0        |
/// | Left           | -speed | 0        |
/// | Left+Forward   | -speed | +speed/2 |
/// | Left+Back      | -speed | -speed   |
/// | Right+Forward  | +speed | +speed   |
/// | Right+Back     | +speed | -speed   |
///
/// With any key held, z keeps whatever the body already had.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlRules {
    pub speed: f32,
}

impl Default for ControlRules {
    fn default() -> Self {
        Self { speed: 4.0 }
    }
}

impl ControlRules {
    /// Velocity command for `input` given the body's current velocity.
    pub fn command(&self, input: &InputState, current: Vec3) -> Vec3 {
        if input.is_empty() {
            return Vec3::ZERO;
        }

        let s = self.speed;
        let forward = input.is_down(Key::Forward);
        let back = input.is_down(Key::Back);
        let left = input.is_down(Key::Left);
        let right = input.is_down(Key::Right);

        let mut v = current;
        let mut set = |x: f32, y: f32| {
            v.x = x;
            v.y = y;
        };
        if forward {
            set(0.0, s);
        }
        if back {
            set(0.0, -s);
        }
        if right {
            set(s, 0.0);
        }
        if left {
            set(-s, 0.0);
        }
        if left && forward {
            set(-s, s / 2.0);
        }
        if left && back {
            set(-s, -s);
        }
        if right && forward {
            set(s, s);
        }
        if right && back {
            set(s, -s);
        }
        v
    }

    /// Apply the override to the world's controlled entity. Angular velocity
    /// is zeroed every frame regardless of input. Returns the velocity
    /// written, or `None` when no entity holds the controlled role.
    pub fn apply<P: PhysicsWorld>(
        &self,
        world: &mut World<P>,
        input: &InputState,
    ) -> Result<Option<Vec3>, KernelError> {
        let Some(id) = world.controlled() else {
            return Ok(None);
        };
        world.set_angular_velocity(id, Vec3::ZERO)?;
        let current = world.velocity(id)?;
        let command = self.command(input, current);
        world.set_velocity(id, command)?;
        tracing::trace!(?id, %command, "control override");
        Ok(Some(command))
    }
}
