use std::fmt::Write as _;

use arena_common::{CameraPose, EntityId, Light, Material, ShapeKind};
use arena_kernel::{Entity, World};
use arena_physics::PhysicsWorld;
use glam::Mat4;
use serde::Serialize;

/// Everything a renderer needs to draw one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRecord {
    pub id: EntityId,
    pub transform: Mat4,
    pub shape: ShapeKind,
    pub material: String,
    /// Resolved material parameters; `None` when the name is not in the table.
    pub params: Option<Material>,
    pub light: Option<Light>,
}

impl RenderRecord {
    pub fn from_entity(entity: &Entity, params: Option<Material>) -> Self {
        Self {
            id: entity.id(),
            transform: *entity.transform(),
            shape: entity.shape().clone(),
            material: entity.material().to_string(),
            params,
            light: entity.light().copied(),
        }
    }
}

/// Renderer-agnostic submission interface.
///
/// Renderers only see records and the camera. They never touch the world.
pub trait Renderer {
    fn set_camera(&mut self, camera: &CameraPose);

    fn submit(&mut self, record: &RenderRecord);
}

/// Hands every visible entity to `renderer` in insertion order, then the
/// camera. Returns the number of records submitted.
pub fn submit_frame<P, R>(world: &World<P>, camera: &CameraPose, renderer: &mut R) -> usize
where
    P: PhysicsWorld,
    R: Renderer + ?Sized,
{
    let mut submitted = 0;
    for entity in world.entities().iter().filter(|e| !e.is_hidden()) {
        let params = world.material(entity.material()).copied();
        renderer.submit(&RenderRecord::from_entity(entity, params));
        submitted += 1;
    }
    renderer.set_camera(camera);
    tracing::trace!(submitted, "frame submitted");
    submitted
}

/// Renders frames as human-readable text.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    out: String,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.out
    }

    /// Return the text accumulated so far and start over.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.out)
    }
}

impl Renderer for DebugTextRenderer {
    fn set_camera(&mut self, camera: &CameraPose) {
        let p = camera.position;
        let _ = writeln!(
            self.out,
            "camera pos=({:.2}, {:.2}, {:.2}) fovy={:.2}",
            p.x, p.y, p.z, camera.fovy
        );
    }

    fn submit(&mut self, record: &RenderRecord) {
        let (_, _, p) = record.transform.to_scale_rotation_translation();
        let _ = write!(
            self.out,
            "  [{}] {} pos=({:.2}, {:.2}, {:.2}) material={}",
            record.id.0,
            record.shape.label(),
            p.x,
            p.y,
            p.z,
            record.material
        );
        if record.light.is_some() {
            self.out.push_str(" light");
        }
        self.out.push('\n');
    }
}

/// One frame as captured by [`RecordingRenderer`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordedFrame {
    pub camera: Option<CameraPose>,
    pub records: Vec<RenderRecord>,
}

/// Collects submitted records frame by frame. A call to `set_camera` closes
/// the current frame.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    current: Vec<RenderRecord>,
    frames: Vec<RecordedFrame>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.frames)
    }
}

impl Renderer for RecordingRenderer {
    fn set_camera(&mut self, camera: &CameraPose) {
        self.frames.push(RecordedFrame {
            camera: Some(*camera),
            records: std::mem::take(&mut self.current),
        });
    }

    fn submit(&mut self, record: &RenderRecord) {
        self.current.push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_kernel::{BoxDesc, SphereDesc};
    use arena_physics::KinematicPhysics;
    use glam::Vec3;

    fn world() -> World<KinematicPhysics> {
        let mut world = World::new(KinematicPhysics::new());
        world.insert_material("white", Material::new(Vec3::ONE, Vec3::ONE));
        world
            .add_box(BoxDesc {
                position: Vec3::new(1.0, 2.0, 3.0),
                ..BoxDesc::default()
            })
            .unwrap();
        world
            .add_sphere(SphereDesc {
                hidden: true,
                ..SphereDesc::default()
            })
            .unwrap();
        world
            .add_sphere(SphereDesc {
                material: "white".into(),
                light: true,
                ..SphereDesc::default()
            })
            .unwrap();
        world
    }

    #[test]
    fn hidden_entities_are_skipped() {
        let world = world();
        let mut renderer = RecordingRenderer::new();
        let n = submit_frame(&world, &CameraPose::default(), &mut renderer);
        assert_eq!(n, 2);
        let frame = renderer.last_frame().unwrap();
        let ids: Vec<_> = frame.records.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(frame.camera, Some(CameraPose::default()));
    }

    #[test]
    fn records_carry_resolved_material_and_light() {
        let world = world();
        let mut renderer = RecordingRenderer::new();
        submit_frame(&world, &CameraPose::default(), &mut renderer);
        let records = &renderer.last_frame().unwrap().records;
        assert_eq!(records[0].params, None);
        assert_eq!(records[1].params, Some(Material::new(Vec3::ONE, Vec3::ONE)));
        assert!(records[1].light.is_some());
    }

    #[test]
    fn debug_text_lists_positions() {
        let world = world();
        let mut renderer = DebugTextRenderer::new();
        submit_frame(&world, &CameraPose::default(), &mut renderer);
        let text = renderer.take();
        assert!(text.contains("[0] box pos=(1.00, 2.00, 3.00)"), "{text}");
        assert!(text.contains("[2] sphere"));
        assert!(text.contains("light"));
        assert!(text.contains("camera pos=(0.00, 1.50, 5.00)"));
        assert!(renderer.output().is_empty());
    }

    #[test]
    fn recording_json_has_one_entry_per_frame() {
        let world = world();
        let mut renderer = RecordingRenderer::new();
        submit_frame(&world, &CameraPose::default(), &mut renderer);
        submit_frame(&world, &CameraPose::default(), &mut renderer);
        let value: serde_json::Value = serde_json::from_str(&renderer.to_json().unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["records"][1]["shape"]["type"], "sphere");
    }
}
