use arena_common::Pose;
use glam::{Mat3, Vec3};

use crate::shape::Shape;

/// World-space collision proxy. Boxes and hulls collide as the axis-aligned
/// box enclosing their rotated bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Proxy {
    Ball { center: Vec3, radius: f32 },
    Aabb { min: Vec3, max: Vec3 },
}

impl Proxy {
    pub(crate) fn new(shape: &Shape, pose: &Pose) -> Self {
        match shape {
            Shape::Sphere { radius } => Self::Ball {
                center: pose.position,
                radius: *radius,
            },
            Shape::Box { half_extents } => enclosing(pose, Vec3::ZERO, *half_extents),
            Shape::ConvexHull { min, max, .. } => {
                enclosing(pose, (*min + *max) * 0.5, (*max - *min) * 0.5)
            }
        }
    }
}

fn enclosing(pose: &Pose, local_center: Vec3, half: Vec3) -> Proxy {
    let q = pose.unit_orientation();
    let m = Mat3::from_quat(q);
    let extent = m.x_axis.abs() * half.x + m.y_axis.abs() * half.y + m.z_axis.abs() * half.z;
    let center = pose.position + q * local_center;
    Proxy::Aabb {
        min: center - extent,
        max: center + extent,
    }
}

/// Penetration between two proxies. `normal` points from the first towards
/// the second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Contact {
    pub normal: Vec3,
    pub depth: f32,
}

pub(crate) fn contact(a: &Proxy, b: &Proxy) -> Option<Contact> {
    match (*a, *b) {
        (Proxy::Ball { center: ca, radius: ra }, Proxy::Ball { center: cb, radius: rb }) => {
            let d = cb - ca;
            let dist = d.length();
            let depth = ra + rb - dist;
            (depth > 0.0).then(|| Contact {
                normal: if dist > 1e-6 { d / dist } else { Vec3::Y },
                depth,
            })
        }
        (Proxy::Ball { center, radius }, Proxy::Aabb { min, max }) => {
            ball_box(center, radius, min, max)
        }
        (Proxy::Aabb { min, max }, Proxy::Ball { center, radius }) => {
            ball_box(center, radius, min, max).map(|c| Contact {
                normal: -c.normal,
                depth: c.depth,
            })
        }
        (Proxy::Aabb { min: amin, max: amax }, Proxy::Aabb { min: bmin, max: bmax }) => {
            let overlap = amax.min(bmax) - amin.max(bmin);
            if overlap.min_element() <= 0.0 {
                return None;
            }
            let towards = (bmin + bmax) - (amin + amax);
            let axis = min_axis(overlap);
            let sign = if towards[axis] < 0.0 { -1.0 } else { 1.0 };
            let mut normal = Vec3::ZERO;
            normal[axis] = sign;
            Some(Contact {
                normal,
                depth: overlap[axis],
            })
        }
    }
}

fn min_axis(v: Vec3) -> usize {
    if v.x <= v.y && v.x <= v.z {
        0
    } else if v.y <= v.z {
        1
    } else {
        2
    }
}

/// Ball against box, normal from the ball towards the box.
fn ball_box(center: Vec3, radius: f32, min: Vec3, max: Vec3) -> Option<Contact> {
    let closest = center.clamp(min, max);
    let d = closest - center;
    let dist = d.length();
    if dist > 1e-6 {
        let depth = radius - dist;
        return (depth > 0.0).then(|| Contact {
            normal: d / dist,
            depth,
        });
    }

    // Center inside the box: leave through the nearest face.
    let to_min = center - min;
    let to_max = max - center;
    let nearest = to_min.min(to_max);
    let axis = min_axis(nearest);
    let mut normal = Vec3::ZERO;
    // Exiting through the max face means the box lies on the min side.
    normal[axis] = if to_max[axis] < to_min[axis] { -1.0 } else { 1.0 };
    Some(Contact {
        normal,
        depth: radius + nearest[axis],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn ball(x: f32, r: f32) -> Proxy {
        Proxy::Ball {
            center: Vec3::new(x, 0.0, 0.0),
            radius: r,
        }
    }

    #[test]
    fn balls_touching_or_apart_have_no_contact() {
        assert!(contact(&ball(0.0, 0.5), &ball(1.0, 0.5)).is_none());
        assert!(contact(&ball(0.0, 0.5), &ball(3.0, 0.5)).is_none());
    }

    #[test]
    fn overlapping_balls() {
        let c = contact(&ball(0.0, 0.5), &ball(0.8, 0.5)).unwrap();
        assert_eq!(c.normal, Vec3::X);
        assert!((c.depth - 0.2).abs() < 1e-6);
    }

    #[test]
    fn ball_against_box_face() {
        let boxed = Proxy::Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let c = contact(&ball(1.25, 0.5), &boxed).unwrap();
        assert_eq!(c.normal, -Vec3::X);
        assert!((c.depth - 0.25).abs() < 1e-6);

        let c = contact(&boxed, &ball(1.25, 0.5)).unwrap();
        assert_eq!(c.normal, Vec3::X);
    }

    #[test]
    fn ball_center_inside_box() {
        let boxed = Proxy::Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let c = contact(&ball(0.75, 0.5), &boxed).unwrap();
        assert_eq!(c.normal, -Vec3::X);
        assert!((c.depth - 0.75).abs() < 1e-6);
    }

    #[test]
    fn boxes_separate_along_least_overlap() {
        let a = Proxy::Aabb {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        let b = Proxy::Aabb {
            min: Vec3::new(0.2, 0.9, 0.1),
            max: Vec3::new(1.2, 1.9, 1.1),
        };
        let c = contact(&a, &b).unwrap();
        assert_eq!(c.normal, Vec3::Y);
        assert!((c.depth - 0.1).abs() < 1e-6);
    }

    #[test]
    fn rotated_box_proxy_grows() {
        let shape = Shape::Box {
            half_extents: Vec3::new(1.0, 0.0, 0.0),
        };
        let pose = Pose::new(Vec3::ZERO, Quat::from_rotation_z(std::f32::consts::FRAC_PI_4));
        let Proxy::Aabb { max, .. } = Proxy::new(&shape, &pose) else {
            panic!("box should map to an aabb");
        };
        let s = std::f32::consts::FRAC_1_SQRT_2;
        assert!((max - Vec3::new(s, s, 0.0)).length() < 1e-5);
    }

    #[test]
    fn hull_proxy_uses_offset_bounds() {
        let shape = Shape::ConvexHull {
            min: Vec3::new(0.0, 0.0, 0.0),
            max: Vec3::new(2.0, 2.0, 2.0),
            point_count: 8,
        };
        let pose = Pose::from_position(Vec3::new(0.0, 0.0, -8.0));
        assert_eq!(
            Proxy::new(&shape, &pose),
            Proxy::Aabb {
                min: Vec3::new(0.0, 0.0, -8.0),
                max: Vec3::new(2.0, 2.0, -6.0),
            }
        );
    }
}
