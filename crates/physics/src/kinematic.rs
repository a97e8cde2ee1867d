use arena_common::Pose;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::contact::{contact, Proxy};
use crate::shape::Shape;
use crate::{BodyDesc, BodyHandle, PhysicsError, PhysicsWorld, ShapeHandle};

/// Tuning for the kinematic backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicConfig {
    pub gravity: Vec3,
    /// Length of one internal substep in seconds.
    pub fixed_timestep: f32,
    /// Resolve overlaps between bodies after every substep.
    pub contacts: bool,
}

impl Default for KinematicConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::ZERO,
            fixed_timestep: 1.0 / 60.0,
            contacts: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    shape: ShapeHandle,
    mass: f32,
    pose: Pose,
    local_inertia: Vec3,
    restitution: f32,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    in_world: bool,
}

impl Body {
    fn is_dynamic(&self) -> bool {
        self.mass != 0.0
    }

    fn inverse_mass(&self) -> f32 {
        if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 }
    }
}

/// Deterministic rigid body integrator with simple contact response.
///
/// Dynamic bodies drift along their linear velocity and spin with their
/// angular velocity; static bodies stay where they were created. After each
/// substep overlapping bodies are pushed apart and exchange an impulse along
/// the contact normal, scaled by the product of their restitutions. Spheres
/// collide as spheres, boxes and hulls as their world-space bounds. Stepping
/// follows the fixed-timestep clamp: time accumulates, at most `substeps`
/// fixed steps run per call and any remainder beyond that budget is dropped.
#[derive(Debug, Clone, Default)]
pub struct KinematicPhysics {
    config: KinematicConfig,
    shapes: Vec<Shape>,
    bodies: Vec<Body>,
    accumulator: f32,
    steps_taken: u64,
}

impl KinematicPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: KinematicConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &KinematicConfig {
        &self.config
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Total fixed substeps integrated so far.
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    pub fn shape(&self, shape: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(shape.0 as usize)
    }

    pub fn is_in_world(&self, body: BodyHandle) -> bool {
        self.bodies.get(body.0 as usize).is_some_and(|b| b.in_world)
    }

    pub fn body_shape(&self, body: BodyHandle) -> Result<ShapeHandle, PhysicsError> {
        Ok(self.body(body)?.shape)
    }

    pub fn local_inertia(&self, body: BodyHandle) -> Result<Vec3, PhysicsError> {
        Ok(self.body(body)?.local_inertia)
    }

    pub fn restitution(&self, body: BodyHandle) -> Result<f32, PhysicsError> {
        Ok(self.body(body)?.restitution)
    }

    pub fn angular_velocity(&self, body: BodyHandle) -> Result<Vec3, PhysicsError> {
        Ok(self.body(body)?.angular_velocity)
    }

    fn body(&self, body: BodyHandle) -> Result<&Body, PhysicsError> {
        self.bodies
            .get(body.0 as usize)
            .ok_or(PhysicsError::UnknownBody(body))
    }

    fn body_mut(&mut self, body: BodyHandle) -> Result<&mut Body, PhysicsError> {
        self.bodies
            .get_mut(body.0 as usize)
            .ok_or(PhysicsError::UnknownBody(body))
    }

    fn push_shape(&mut self, shape: Shape) -> ShapeHandle {
        let handle = ShapeHandle(self.shapes.len() as u32);
        self.shapes.push(shape);
        handle
    }

    /// Integrate every simulated body by `h` seconds into `out` without
    /// touching `self.bodies`.
    fn integrate_into(&self, h: f32, out: &mut [Body]) -> Result<(), PhysicsError> {
        for (i, body) in out.iter_mut().enumerate() {
            if !body.in_world || !body.is_dynamic() {
                continue;
            }
            body.linear_velocity += self.config.gravity * h;
            body.pose.position += body.linear_velocity * h;

            let w = body.angular_velocity;
            if w != Vec3::ZERO {
                let q = body.pose.orientation;
                let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * q;
                body.pose.orientation = (q + spin * (0.5 * h)).normalize();
            }

            if !body.pose.is_finite() || !body.linear_velocity.is_finite() {
                return Err(PhysicsError::StepFault {
                    reason: format!("body {i} diverged to a non-finite state"),
                });
            }
        }
        if self.config.contacts {
            self.resolve_contacts(out)?;
            if let Some(i) = out
                .iter()
                .position(|b| !b.pose.is_finite() || !b.linear_velocity.is_finite())
            {
                return Err(PhysicsError::StepFault {
                    reason: format!("contact response drove body {i} non-finite"),
                });
            }
        }
        Ok(())
    }

    /// One pass over every body pair. Returns the number of contacts resolved.
    fn resolve_contacts(&self, out: &mut [Body]) -> Result<usize, PhysicsError> {
        let mut resolved = 0;
        for i in 0..out.len() {
            for j in (i + 1)..out.len() {
                let (a, b) = (out[i], out[j]);
                if !a.in_world || !b.in_world {
                    continue;
                }
                let (inv_a, inv_b) = (a.inverse_mass(), b.inverse_mass());
                let inv_sum = inv_a + inv_b;
                if inv_sum == 0.0 {
                    continue;
                }
                let hit = contact(
                    &Proxy::new(self.shape_of(&a)?, &a.pose),
                    &Proxy::new(self.shape_of(&b)?, &b.pose),
                );
                let Some(hit) = hit else {
                    continue;
                };

                let n = hit.normal;
                let closing = (b.linear_velocity - a.linear_velocity).dot(n);
                if closing < 0.0 {
                    let e = a.restitution * b.restitution;
                    let impulse = -(1.0 + e) * closing / inv_sum;
                    out[i].linear_velocity -= n * (impulse * inv_a);
                    out[j].linear_velocity += n * (impulse * inv_b);
                }
                let push = n * (hit.depth / inv_sum);
                out[i].pose.position -= push * inv_a;
                out[j].pose.position += push * inv_b;
                resolved += 1;
            }
        }
        if resolved > 0 {
            tracing::trace!(resolved, "contacts resolved");
        }
        Ok(resolved)
    }

    fn shape_of(&self, body: &Body) -> Result<&Shape, PhysicsError> {
        self.shapes
            .get(body.shape.0 as usize)
            .ok_or(PhysicsError::UnknownShape(body.shape))
    }
}

impl PhysicsWorld for KinematicPhysics {
    fn create_box_shape(&mut self, half_extents: Vec3) -> Result<ShapeHandle, PhysicsError> {
        Ok(self.push_shape(Shape::cuboid(half_extents)?))
    }

    fn create_sphere_shape(&mut self, radius: f32) -> Result<ShapeHandle, PhysicsError> {
        Ok(self.push_shape(Shape::ball(radius)?))
    }

    fn create_convex_shape_from_triangles(
        &mut self,
        vertices: &[Vec3],
        faces: &[[u32; 3]],
    ) -> Result<ShapeHandle, PhysicsError> {
        Ok(self.push_shape(Shape::convex_from_triangles(vertices, faces)?))
    }

    fn compute_local_inertia(
        &self,
        shape: ShapeHandle,
        mass: f32,
        inertia: &mut Vec3,
    ) -> Result<(), PhysicsError> {
        let shape_data = self
            .shapes
            .get(shape.0 as usize)
            .ok_or(PhysicsError::UnknownShape(shape))?;
        *inertia = shape_data.local_inertia(mass);
        Ok(())
    }

    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError> {
        if desc.shape.0 as usize >= self.shapes.len() {
            return Err(PhysicsError::UnknownShape(desc.shape));
        }
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(Body {
            shape: desc.shape,
            mass: desc.mass,
            pose: Pose::new(desc.pose.position, desc.pose.unit_orientation()),
            local_inertia: desc.local_inertia,
            restitution: desc.restitution,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            in_world: false,
        });
        tracing::trace!(?handle, shape = ?desc.shape, mass = desc.mass, "created body");
        Ok(handle)
    }

    fn add_body(&mut self, body: BodyHandle) -> Result<(), PhysicsError> {
        self.body_mut(body)?.in_world = true;
        Ok(())
    }

    /// Handles are never reused, so a removed body just leaves the simulation.
    fn remove_body(&mut self, body: BodyHandle) -> Result<(), PhysicsError> {
        self.body_mut(body)?.in_world = false;
        Ok(())
    }

    fn step(&mut self, dt: f32, substeps: u32) -> Result<(), PhysicsError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(PhysicsError::StepFault {
                reason: format!("invalid time step {dt}"),
            });
        }
        if dt == 0.0 {
            return Ok(());
        }

        let fixed = self.config.fixed_timestep;
        let (step_len, count, remainder) = if substeps == 0 || fixed <= 0.0 {
            (dt, 1, self.accumulator)
        } else {
            let total = self.accumulator + dt;
            let available = (total / fixed).floor() as u32;
            let remainder = total - available as f32 * fixed;
            (fixed, available.min(substeps), remainder)
        };

        let mut next = self.bodies.clone();
        for _ in 0..count {
            self.integrate_into(step_len, &mut next)?;
        }

        self.bodies = next;
        self.accumulator = remainder;
        self.steps_taken += count as u64;
        tracing::trace!(dt, substeps = count, "kinematic step");
        Ok(())
    }

    fn pose(&self, body: BodyHandle) -> Result<Pose, PhysicsError> {
        Ok(self.body(body)?.pose)
    }

    fn linear_velocity(&self, body: BodyHandle) -> Result<Vec3, PhysicsError> {
        Ok(self.body(body)?.linear_velocity)
    }

    fn set_linear_velocity(
        &mut self,
        body: BodyHandle,
        velocity: Vec3,
    ) -> Result<(), PhysicsError> {
        self.body_mut(body)?.linear_velocity = velocity;
        Ok(())
    }

    fn set_angular_velocity(
        &mut self,
        body: BodyHandle,
        velocity: Vec3,
    ) -> Result<(), PhysicsError> {
        self.body_mut(body)?.angular_velocity = velocity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_sphere(physics: &mut KinematicPhysics, at: Vec3) -> BodyHandle {
        let shape = physics.create_sphere_shape(0.5).unwrap();
        let body = physics
            .create_body(BodyDesc {
                shape,
                mass: 1.0,
                pose: Pose::from_position(at),
                local_inertia: Vec3::ONE,
                restitution: 0.5,
            })
            .unwrap();
        physics.add_body(body).unwrap();
        body
    }

    fn body_with(
        physics: &mut KinematicPhysics,
        shape: ShapeHandle,
        mass: f32,
        at: Vec3,
        restitution: f32,
    ) -> BodyHandle {
        let body = physics
            .create_body(BodyDesc {
                shape,
                mass,
                pose: Pose::from_position(at),
                local_inertia: Vec3::ONE,
                restitution,
            })
            .unwrap();
        physics.add_body(body).unwrap();
        body
    }

    #[test]
    fn projectile_knocks_dynamic_hull() {
        let mut p = KinematicPhysics::new();
        let hull = p
            .create_convex_shape_from_triangles(
                &[
                    Vec3::new(1.0, 1.0, 1.0),
                    Vec3::new(-1.0, -1.0, 1.0),
                    Vec3::new(-1.0, 1.0, -1.0),
                    Vec3::new(1.0, -1.0, -1.0),
                ],
                &[[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]],
            )
            .unwrap();
        let target = body_with(&mut p, hull, 1.0, Vec3::ZERO, 0.5);
        let ball = p.create_sphere_shape(0.6).unwrap();
        let projectile = body_with(&mut p, ball, 0.1, Vec3::new(0.0, 0.0, -5.0), 0.1);
        p.set_linear_velocity(projectile, Vec3::new(0.0, 0.0, 4.0)).unwrap();

        for _ in 0..120 {
            p.step(1.0 / 60.0, 10).unwrap();
        }
        let v = p.linear_velocity(target).unwrap();
        assert!(v.z > 0.0, "target velocity {v}");
        assert!(p.pose(projectile).unwrap().position.z < 0.0);
    }

    #[test]
    fn static_ground_stops_falling_sphere() {
        let mut p = KinematicPhysics::new();
        let slab = p.create_box_shape(Vec3::new(10.0, 0.5, 10.0)).unwrap();
        let ground = body_with(&mut p, slab, 0.0, Vec3::new(0.0, -0.5, 0.0), 0.5);
        let ball = p.create_sphere_shape(0.5).unwrap();
        let b = body_with(&mut p, ball, 1.0, Vec3::new(0.0, 2.0, 0.0), 0.0);
        p.set_linear_velocity(b, Vec3::new(0.0, -3.0, 0.0)).unwrap();

        for _ in 0..120 {
            p.step(1.0 / 60.0, 10).unwrap();
        }
        let y = p.pose(b).unwrap().position.y;
        assert!((y - 0.5).abs() < 0.06, "y = {y}");
        assert!(p.linear_velocity(b).unwrap().y.abs() < 1e-4);
        assert_eq!(p.pose(ground).unwrap().position, Vec3::new(0.0, -0.5, 0.0));
    }

    #[test]
    fn contacts_can_be_disabled() {
        let mut p = KinematicPhysics::with_config(KinematicConfig {
            contacts: false,
            ..KinematicConfig::default()
        });
        let a = dynamic_sphere(&mut p, Vec3::ZERO);
        let b = dynamic_sphere(&mut p, Vec3::new(0.5, 0.0, 0.0));
        p.step(1.0 / 60.0, 10).unwrap();
        assert_eq!(p.pose(a).unwrap().position, Vec3::ZERO);
        assert_eq!(p.pose(b).unwrap().position.x, 0.5);
    }

    #[test]
    fn removed_body_leaves_simulation() {
        let mut p = KinematicPhysics::new();
        let b = dynamic_sphere(&mut p, Vec3::ZERO);
        p.remove_body(b).unwrap();
        assert!(!p.is_in_world(b));
        p.set_linear_velocity(b, Vec3::X).unwrap();
        p.step(0.5, 10).unwrap();
        assert_eq!(p.pose(b).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn zero_dt_is_noop() {
        let mut p = KinematicPhysics::new();
        let b = dynamic_sphere(&mut p, Vec3::ONE);
        p.set_linear_velocity(b, Vec3::X).unwrap();
        p.step(0.0, 10).unwrap();
        assert_eq!(p.pose(b).unwrap().position, Vec3::ONE);
        assert_eq!(p.steps_taken(), 0);
    }

    #[test]
    fn moves_along_velocity() {
        let mut p = KinematicPhysics::new();
        let b = dynamic_sphere(&mut p, Vec3::ZERO);
        p.set_linear_velocity(b, Vec3::new(6.0, 0.0, 0.0)).unwrap();
        p.step(10.5 / 60.0, 10).unwrap();
        let x = p.pose(b).unwrap().position.x;
        assert!((x - 1.0).abs() < 1e-4, "x = {x}");
        assert_eq!(p.steps_taken(), 10);
    }

    #[test]
    fn substep_budget_drops_excess_time() {
        let mut p = KinematicPhysics::new();
        let b = dynamic_sphere(&mut p, Vec3::ZERO);
        p.set_linear_velocity(b, Vec3::new(60.0, 0.0, 0.0)).unwrap();
        p.step(1.0, 2).unwrap();
        assert_eq!(p.steps_taken(), 2);
        let x = p.pose(b).unwrap().position.x;
        assert!((x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn small_steps_accumulate() {
        let mut p = KinematicPhysics::new();
        let b = dynamic_sphere(&mut p, Vec3::ZERO);
        p.set_linear_velocity(b, Vec3::Y).unwrap();
        p.step(1.0 / 120.0, 10).unwrap();
        assert_eq!(p.steps_taken(), 0);
        p.step(1.0 / 120.0 + 1e-5, 10).unwrap();
        assert_eq!(p.steps_taken(), 1);
        assert!(p.pose(b).unwrap().position.y > 0.0);
    }

    #[test]
    fn static_bodies_do_not_move() {
        let mut p = KinematicPhysics::with_config(KinematicConfig {
            gravity: Vec3::new(0.0, -9.8, 0.0),
            ..KinematicConfig::default()
        });
        let shape = p.create_box_shape(Vec3::ONE).unwrap();
        let b = p
            .create_body(BodyDesc {
                shape,
                mass: 0.0,
                pose: Pose::default(),
                local_inertia: Vec3::ZERO,
                restitution: 0.0,
            })
            .unwrap();
        p.add_body(b).unwrap();
        p.set_linear_velocity(b, Vec3::X).unwrap();
        p.step(0.5, 10).unwrap();
        assert_eq!(p.pose(b).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn bodies_outside_world_do_not_move() {
        let mut p = KinematicPhysics::new();
        let shape = p.create_sphere_shape(1.0).unwrap();
        let b = p
            .create_body(BodyDesc {
                shape,
                mass: 1.0,
                pose: Pose::default(),
                local_inertia: Vec3::ONE,
                restitution: 0.0,
            })
            .unwrap();
        p.set_linear_velocity(b, Vec3::X).unwrap();
        p.step(0.1, 10).unwrap();
        assert!(!p.is_in_world(b));
        assert_eq!(p.pose(b).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn spin_keeps_orientation_normalized() {
        let mut p = KinematicPhysics::new();
        let b = dynamic_sphere(&mut p, Vec3::ZERO);
        p.set_angular_velocity(b, Vec3::new(0.0, 3.0, 0.0)).unwrap();
        for _ in 0..20 {
            p.step(1.0 / 60.0, 10).unwrap();
        }
        let q = p.pose(b).unwrap().orientation;
        assert!((q.length() - 1.0).abs() < 1e-5);
        assert_ne!(q, Quat::IDENTITY);
    }

    #[test]
    fn negative_dt_faults() {
        let mut p = KinematicPhysics::new();
        assert!(matches!(
            p.step(-1.0, 10),
            Err(PhysicsError::StepFault { .. })
        ));
        assert!(matches!(
            p.step(f32::NAN, 10),
            Err(PhysicsError::StepFault { .. })
        ));
    }

    #[test]
    fn divergent_step_leaves_state_untouched() {
        let mut p = KinematicPhysics::new();
        let b = dynamic_sphere(&mut p, Vec3::ONE);
        p.set_linear_velocity(b, Vec3::new(f32::INFINITY, 0.0, 0.0))
            .unwrap();
        let before = p.pose(b).unwrap();
        let err = p.step(1.0, 10).unwrap_err();
        assert!(matches!(err, PhysicsError::StepFault { .. }));
        assert_eq!(p.pose(b).unwrap(), before);
        assert_eq!(p.steps_taken(), 0);
    }

    #[test]
    fn inertia_overwrites_scratch() {
        let mut p = KinematicPhysics::new();
        let shape = p.create_sphere_shape(1.0).unwrap();
        let mut scratch = Vec3::new(0.05, 0.07, 0.09);
        p.compute_local_inertia(shape, 1.0, &mut scratch).unwrap();
        assert!((scratch - Vec3::splat(0.4)).length() < 1e-6);
    }

    #[test]
    fn unknown_handles_error() {
        let mut p = KinematicPhysics::new();
        assert!(matches!(
            p.pose(BodyHandle(3)),
            Err(PhysicsError::UnknownBody(BodyHandle(3)))
        ));
        let mut scratch = Vec3::ZERO;
        assert!(matches!(
            p.compute_local_inertia(ShapeHandle(0), 1.0, &mut scratch),
            Err(PhysicsError::UnknownShape(_))
        ));
        assert!(p
            .create_body(BodyDesc {
                shape: ShapeHandle(9),
                mass: 1.0,
                pose: Pose::default(),
                local_inertia: Vec3::ZERO,
                restitution: 0.0,
            })
            .is_err());
    }
}
