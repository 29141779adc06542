use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tephra::camera::FlyCamera;
use tephra::config::Config;
use tephra::player::{Player, PlayerInput};
use tephra::render::StatsBackend;
use tephra::world::World;
use tephra::worldgen::ProceduralSource;
use tephra_blocks::BlockRegistry;
use tephra_chunk::ChunkCoord;
use tephra_geom::Vec3;
use tephra_runtime::RuntimeOptions;

/// Headless soak run: streams terrain around a scripted observer and
/// reports draw statistics.
#[derive(Parser, Debug)]
#[command(name = "tephra")]
struct Args {
    /// Path to a config TOML; defaults apply when absent.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path to the block definitions TOML.
    #[arg(long, default_value = "assets/voxels/blocks.toml")]
    blocks: PathBuf,
    /// Frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u32,
    /// Override the configured window radius.
    #[arg(long)]
    radius: Option<i32>,
}

const FALLBACK_BLOCKS: &str = include_str!("../assets/voxels/blocks.toml");

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => match Config::load_from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::error!("failed to load {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(r) = args.radius {
        cfg.radius = r;
    }

    let reg = match BlockRegistry::load_from_path(&args.blocks) {
        Ok(reg) => reg,
        Err(e) => {
            log::warn!(
                "block registry at {} unusable ({e}); using built-in definitions",
                args.blocks.display()
            );
            BlockRegistry::from_toml(FALLBACK_BLOCKS).expect("built-in block definitions")
        }
    };
    let reg = Arc::new(reg);

    let source = Arc::new(ProceduralSource::new(cfg.seed, &reg));
    let spawn = Vec3::new(8.0, 96.0, 8.0);
    let mut world = World::new(
        cfg.radius,
        ChunkCoord::containing(spawn.x, spawn.z),
        Arc::clone(&reg),
        source,
        RuntimeOptions {
            mesh_workers: cfg.mesh_workers,
            load_workers: cfg.load_workers,
        },
    );

    world.set_walk_limit(cfg.max_walk_distance_sq);

    let mut player = Player::new(spawn);
    let mut camera = FlyCamera::new(spawn);
    camera.fov_y_deg = cfg.fov_y_deg;
    let mut backend = StatsBackend::default();

    log::info!(
        "soak: radius {} seed {} frames {}",
        cfg.radius,
        cfg.seed,
        args.frames
    );

    let dt = 1.0 / 60.0;
    let input = PlayerInput {
        forward: 1.0,
        ..PlayerInput::default()
    };
    for frame in 0..args.frames {
        // Slow turn so the walk covers fresh chunks in every direction.
        camera.yaw = -45.0 + frame as f32 * 0.2;
        camera.position = player.eye_position();

        world.advance(player.pos.x, player.pos.z);
        player.advance(&input, &camera.basis(), &world, dt);
        world.draw(camera.position, &camera.frustum(), &mut backend);

        if frame % 60 == 0 {
            let (qm, im, ql, il) = world.queue_debug_counts();
            log::info!(
                "frame {frame}: pos ({:.1}, {:.1}, {:.1}) draws {}o/{}t tris {} queues {qm}+{im} mesh {ql}+{il} load",
                player.pos.x,
                player.pos.y,
                player.pos.z,
                backend.opaque_draws,
                backend.transparent_draws,
                backend.triangles,
            );
        }
        backend.reset();
    }
    log::info!("soak finished at ({:.1}, {:.1})", player.pos.x, player.pos.z);
}
