use arena_common::Pose;
use glam::{Mat4, Vec3};

/// Render transform for a body: `T(position) * R(orientation) * S(scale)`.
///
/// Applied to object-space points right to left, so scale happens first,
/// then rotation, then translation. Rotation and non-uniform scale do not
/// commute; this order is fixed. The orientation is renormalized on read.
pub fn build_transform(pose: &Pose, scale: Vec3) -> Mat4 {
    Mat4::from_translation(pose.position)
        * Mat4::from_quat(pose.unit_orientation())
        * Mat4::from_scale(scale)
}
