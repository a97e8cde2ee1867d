use arena_common::{EntityId, ShapeKind};
use arena_kernel::World;
use arena_physics::PhysicsWorld;

/// World inspector for developer tooling.
///
/// Read-only queries against the world for debugging and the CLI.
pub struct WorldInspector;

impl WorldInspector {
    pub fn summary<P: PhysicsWorld>(world: &World<P>) -> WorldSummary {
        let mut summary = WorldSummary {
            entity_count: world.entity_count(),
            controlled: world.controlled(),
            emitter: world.emitter(),
            ..WorldSummary::default()
        };
        for e in world.entities() {
            match e.shape() {
                ShapeKind::Box => summary.boxes += 1,
                ShapeKind::Sphere => summary.spheres += 1,
                ShapeKind::Mesh { .. } => summary.meshes += 1,
            }
            if e.light().is_some() {
                summary.lights += 1;
            }
            if e.is_hidden() {
                summary.hidden += 1;
            }
        }
        summary
    }

    pub fn inspect_entity<P: PhysicsWorld>(world: &World<P>, id: EntityId) -> Option<EntityInfo> {
        world.get(id).map(|e| {
            let p = e.pose().position;
            let r = e.pose().orientation;
            let s = e.scale();
            EntityInfo {
                id,
                name: e.name().map(str::to_string),
                shape: e.shape().label(),
                material: e.material().to_string(),
                position: [p.x, p.y, p.z],
                rotation: [r.x, r.y, r.z, r.w],
                scale: [s.x, s.y, s.z],
                mass: e.mass(),
                light: e.light().is_some(),
                hidden: e.is_hidden(),
            }
        })
    }

    pub fn list_entities<P: PhysicsWorld>(world: &World<P>) -> Vec<EntityId> {
        world.entities().iter().map(|e| e.id()).collect()
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldSummary {
    pub entity_count: usize,
    pub boxes: usize,
    pub spheres: usize,
    pub meshes: usize,
    pub lights: usize,
    pub hidden: usize,
    pub controlled: Option<EntityId>,
    pub emitter: Option<EntityId>,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World: entities={} (boxes={} spheres={} meshes={}) lights={} hidden={}",
            self.entity_count, self.boxes, self.spheres, self.meshes, self.lights, self.hidden
        )?;
        if let Some(id) = self.controlled {
            write!(f, " controlled={}", id.0)?;
        }
        if let Some(id) = self.emitter {
            write!(f, " emitter={}", id.0)?;
        }
        Ok(())
    }
}

/// Detailed info about a single entity.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub id: EntityId,
    pub name: Option<String>,
    pub shape: &'static str,
    pub material: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub mass: f32,
    pub light: bool,
    pub hidden: bool,
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Entity [{}] {} {} pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2}) mass={:.2} material={}",
            self.id.0,
            self.name.as_deref().unwrap_or("-"),
            self.shape,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
            self.mass,
            self.material,
        )?;
        if self.light {
            write!(f, " light")?;
        }
        if self.hidden {
            write!(f, " hidden")?;
        }
        Ok(())
    }
}
