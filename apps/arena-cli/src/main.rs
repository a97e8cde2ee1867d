use std::path::{Path, PathBuf};

use anyhow::Context;
use arena_assets::{tetrahedron, FileMeshLoader, MemoryMeshLoader, MeshLoader};
use arena_input::SharedInput;
use arena_kernel::{
    BoxDesc, FixedStepTimeSource, FrameOrchestrator, MeshDesc, RandomPopulation, Roles,
    SceneConfig, World,
};
use arena_physics::KinematicPhysics;
use arena_render::{submit_frame, DebugTextRenderer, RecordingRenderer};
use arena_tools::WorldInspector;
use clap::{Parser, Subcommand};
use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

const BUILTIN_MESH: &str = "builtin/tetrahedron";

#[derive(Parser)]
#[command(name = "arena-cli", about = "Headless particle arena driver")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Simulate a scene for a number of frames
    Run {
        /// Scene file (YAML). The built-in arena is used when omitted.
        #[arg(short, long)]
        scene: Option<PathBuf>,
        /// Number of frames to simulate
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// Seconds between frames
        #[arg(long, default_value = "0.016666668")]
        dt: f64,
        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Keys held for the whole run, e.g. "wa"
        #[arg(short, long, default_value = "")]
        keys: String,
        /// Write every rendered frame as JSON to this path
        #[arg(long)]
        dump: Option<PathBuf>,
        /// Print a JSON frame report per frame
        #[arg(long)]
        json: bool,
    },
    /// Build a scene and print its entities
    Inspect {
        #[arg(short, long)]
        scene: Option<PathBuf>,
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("arena-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", arena_kernel::crate_info());
            println!("physics: {}", arena_physics::crate_info());
            println!("assets: {}", arena_assets::crate_info());
            println!("input: {}", arena_input::crate_info());
            println!("render: {}", arena_render::crate_info());
            println!("tools: {}", arena_tools::crate_info());
        }
        Commands::Run {
            scene,
            frames,
            dt,
            seed,
            keys,
            dump,
            json,
        } => {
            let (config, loader) = load_scene(scene.as_deref())?;
            let mut rng = StdRng::seed_from_u64(seed);
            let mut world = build(&config, loader.as_ref(), &mut rng)?;
            run(&config, &mut world, frames, dt, &keys, dump.as_deref(), json, &mut rng)?;
        }
        Commands::Inspect { scene, seed } => {
            let (config, loader) = load_scene(scene.as_deref())?;
            let mut rng = StdRng::seed_from_u64(seed);
            let world = build(&config, loader.as_ref(), &mut rng)?;
            println!("{}", WorldInspector::summary(&world));
            for id in WorldInspector::list_entities(&world) {
                if let Some(info) = WorldInspector::inspect_entity(&world, id) {
                    println!("  {info}");
                }
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run(
    config: &SceneConfig,
    world: &mut World<KinematicPhysics>,
    frames: u64,
    dt: f64,
    keys: &str,
    dump: Option<&Path>,
    json: bool,
    rng: &mut StdRng,
) -> anyhow::Result<()> {
    let input = SharedInput::new();
    for c in keys.chars() {
        match arena_input::Key::from_char(c) {
            Some(key) => input.press(key),
            None => tracing::warn!(key = %c, "ignoring unmapped key"),
        }
    }

    let mut orchestrator = FrameOrchestrator::new(FixedStepTimeSource::new(dt), config.frame.clone())
        .with_camera(config.camera);
    let mut recorder = dump.map(|_| RecordingRenderer::new());
    let mut text = DebugTextRenderer::new();
    let mut knocked_loose = false;

    for _ in 0..frames {
        let report = orchestrator
            .step(world, &input.snapshot(), rng)
            .context("simulation halted")?;
        match recorder.as_mut() {
            Some(recorder) => submit_frame(world, orchestrator.camera(), recorder),
            None => submit_frame(world, orchestrator.camera(), &mut text),
        };
        if json {
            println!("{}", serde_json::to_string(&report)?);
        }
        if report.emitter_moving && !knocked_loose {
            knocked_loose = true;
            tracing::info!(frame = report.frame, "emitter knocked loose");
        }
        // Only the final frame's text is printed.
        if recorder.is_none() && report.frame + 1 < frames {
            text.take();
        }
    }

    match (dump, recorder) {
        (Some(path), Some(recorder)) => {
            std::fs::write(path, recorder.to_json()?)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {} frames to {}", recorder.frames().len(), path.display());
        }
        _ if !json => print!("{}", text.take()),
        _ => {}
    }

    println!(
        "frames={} elapsed={:.3}s tick={} spawned={} hash={:#018x} emitter_moving={}",
        orchestrator.frame(),
        orchestrator.clock().elapsed(),
        orchestrator.clock().tick(),
        orchestrator.spawn_trigger().fired(),
        world.state_hash(),
        knocked_loose
    );
    Ok(())
}

fn load_scene(path: Option<&Path>) -> anyhow::Result<(SceneConfig, Box<dyn MeshLoader>)> {
    match path {
        Some(path) => {
            let config = SceneConfig::load(path)
                .with_context(|| format!("loading scene {}", path.display()))?;
            let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
            Ok((config, Box::new(FileMeshLoader::with_root(root))))
        }
        None => {
            let mut loader = MemoryMeshLoader::new();
            loader.insert(BUILTIN_MESH, tetrahedron());
            Ok((builtin_scene(), Box::new(loader)))
        }
    }
}

fn build(
    config: &SceneConfig,
    loader: &dyn MeshLoader,
    rng: &mut StdRng,
) -> anyhow::Result<World<KinematicPhysics>> {
    let physics = KinematicPhysics::with_config(config.physics);
    let world = config
        .build_world(physics, loader, rng)
        .context("building scene")?;
    Ok(world)
}

/// Ground, a steerable box, a mesh emitter and a field of random bodies.
fn builtin_scene() -> SceneConfig {
    SceneConfig {
        boxes: vec![
            BoxDesc {
                name: Some("ground".into()),
                position: Vec3::new(0.0, -0.5, 0.0),
                scale: Vec3::new(20.0, 1.0, 20.0),
                mass: 0.0,
                material: "ground".into(),
                ..BoxDesc::default()
            },
            BoxDesc {
                name: Some("cow".into()),
                position: Vec3::new(0.0, 1.0, 0.0),
                material: "green".into(),
                ..BoxDesc::default()
            },
        ],
        meshes: vec![MeshDesc {
            name: Some("groudon".into()),
            path: BUILTIN_MESH.into(),
            position: Vec3::new(0.0, 1.0, -8.0),
            material: "redambient".into(),
            ..MeshDesc::default()
        }],
        random: RandomPopulation {
            spheres: 10,
            boxes: 10,
        },
        roles: Roles {
            controlled: Some("cow".into()),
            emitter: Some("groudon".into()),
        },
        ..SceneConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_input::InputState;

    #[test]
    fn builtin_scene_builds_with_roles() {
        let (config, loader) = load_scene(None).unwrap();
        let world = build(&config, loader.as_ref(), &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(world.entity_count(), 2 + 1 + 10 + 10);
        assert_eq!(world.controlled(), world.find("cow"));
        assert_eq!(world.emitter(), world.find("groudon"));
    }

    #[test]
    fn bundled_scene_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenes/arena.yaml");
        let (config, loader) = load_scene(Some(&path)).unwrap();
        let world = build(&config, loader.as_ref(), &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(world.entity_count(), 23);
        assert!(world.find("groudon").is_some());
    }

    #[test]
    fn builtin_scene_spawns_after_two_seconds() {
        let (config, loader) = load_scene(None).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut world = build(&config, loader.as_ref(), &mut rng).unwrap();
        let mut orch = FrameOrchestrator::new(FixedStepTimeSource::new(0.125), config.frame.clone());
        for _ in 0..20 {
            orch.step(&mut world, &InputState::new(), &mut rng).unwrap();
        }
        assert_eq!(orch.spawn_trigger().fired(), 1);
    }
}
