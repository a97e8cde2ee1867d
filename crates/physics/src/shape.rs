use glam::Vec3;

use crate::PhysicsError;

/// Collision shape geometry stored by the kinematic backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Convex hull approximated by the bounds of its points.
    ConvexHull { min: Vec3, max: Vec3, point_count: usize },
}

impl Shape {
    pub fn cuboid(half_extents: Vec3) -> Result<Self, PhysicsError> {
        if !half_extents.is_finite() || half_extents.min_element() < 0.0 {
            return Err(PhysicsError::DegenerateShape(format!(
                "box half extents {half_extents}"
            )));
        }
        Ok(Self::Box { half_extents })
    }

    pub fn ball(radius: f32) -> Result<Self, PhysicsError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(PhysicsError::DegenerateShape(format!(
                "sphere radius {radius}"
            )));
        }
        Ok(Self::Sphere { radius })
    }

    /// Hull over every vertex referenced by `faces`.
    pub fn convex_from_triangles(
        vertices: &[Vec3],
        faces: &[[u32; 3]],
    ) -> Result<Self, PhysicsError> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut point_count = 0;
        for face in faces {
            for &index in face {
                let v = vertices.get(index as usize).ok_or_else(|| {
                    PhysicsError::DegenerateShape(format!(
                        "face index {index} out of {} vertices",
                        vertices.len()
                    ))
                })?;
                min = min.min(*v);
                max = max.max(*v);
                point_count += 1;
            }
        }
        if point_count == 0 || !min.is_finite() || !max.is_finite() {
            return Err(PhysicsError::DegenerateShape(
                "convex shape needs at least one finite triangle".into(),
            ));
        }
        Ok(Self::ConvexHull {
            min,
            max,
            point_count,
        })
    }

    /// Diagonal inertia tensor for a body of `mass`.
    pub fn local_inertia(&self, mass: f32) -> Vec3 {
        match self {
            Self::Box { half_extents } => box_inertia(*half_extents * 2.0, mass),
            Self::Sphere { radius } => Vec3::splat(0.4 * mass * radius * radius),
            Self::ConvexHull { min, max, .. } => box_inertia(*max - *min, mass),
        }
    }
}

fn box_inertia(extents: Vec3, mass: f32) -> Vec3 {
    let sq = extents * extents;
    mass / 12.0 * Vec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_inertia() {
        let s = Shape::ball(0.5).unwrap();
        let i = s.local_inertia(2.0);
        assert!((i.x - 0.2).abs() < 1e-6);
        assert_eq!(i.x, i.y);
        assert_eq!(i.y, i.z);
    }

    #[test]
    fn unit_cube_inertia() {
        let s = Shape::cuboid(Vec3::splat(0.5)).unwrap();
        let i = s.local_inertia(6.0);
        // 6/12 * (1 + 1)
        assert!((i - Vec3::ONE).length() < 1e-6);
    }

    #[test]
    fn negative_extents_rejected() {
        assert!(Shape::cuboid(Vec3::new(1.0, -1.0, 1.0)).is_err());
        assert!(Shape::ball(f32::NAN).is_err());
    }

    #[test]
    fn zero_sized_shapes_allowed() {
        assert!(Shape::cuboid(Vec3::ZERO).is_ok());
        assert!(Shape::ball(0.0).is_ok());
    }

    #[test]
    fn convex_hull_bounds() {
        let vertices = [
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(100.0, 100.0, 100.0),
        ];
        let hull = Shape::convex_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        match hull {
            Shape::ConvexHull {
                min,
                max,
                point_count,
            } => {
                assert_eq!(min, Vec3::new(-1.0, 0.0, 0.0));
                assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
                assert_eq!(point_count, 3);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn convex_hull_rejects_bad_index() {
        let vertices = [Vec3::ZERO];
        assert!(Shape::convex_from_triangles(&vertices, &[[0, 0, 5]]).is_err());
        assert!(Shape::convex_from_triangles(&vertices, &[]).is_err());
    }
}
