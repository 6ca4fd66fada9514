use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hillroll_camera::CameraId;
use hillroll_kernel::{World, WorldConfig, WorldEvent};
use hillroll_render::{DebugTextRenderer, DrawListBuilder, Renderer};
use hillroll_terrain::HeightField;

#[derive(Parser)]
#[command(name = "hillroll", about = "Headless driver for the hillroll runtime")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the default world parameters
    Info,
    /// Print the default world config as YAML
    Config,
    /// Generate a height field and summarize it
    Generate {
        /// Terrain seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// World config YAML; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Dump every sample as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Run a headless simulation with rapier physics
    Run {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Terrain seed, overriding the config
        #[arg(short, long)]
        seed: Option<u64>,
        /// Simulated frames per second
        #[arg(long, default_value = "60")]
        fps: f32,
        /// World config YAML; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Player input held for the whole run: >0 forward, <0 backward
        #[arg(short, long, default_value = "1", allow_hyphen_values = true)]
        accelerate: f32,
        /// Surface size in pixels, as WIDTHxHEIGHT
        #[arg(long, default_value = "800x480")]
        surface: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            let config = WorldConfig::default();
            println!("hillroll v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "terrain: {} samples, {:.2} m long",
                config.terrain.total_samples(),
                (config.terrain.total_samples() - 1) as f32 * config.terrain.scale_x
            );
            println!(
                "stream: segment_size={} lookahead={} retire={} soft_limit={}",
                config.stream.segment_size,
                config.stream.lookahead_fraction,
                config.stream.retire,
                config.stream.max_live_segments
            );
            println!(
                "camera: viewport={}x{} m, terrain {} px/m",
                config.camera.viewport_width,
                config.camera.viewport_height,
                config.camera.terrain_pixels_per_meter
            );
            println!(
                "physics: gravity={} step={:.4}s mode={:?}",
                config.physics.gravity, config.physics.fixed_step, config.physics.mode
            );
        }
        Commands::Config => {
            print!("{}", WorldConfig::default().to_yaml_string()?);
        }
        Commands::Generate { seed, config, json } => {
            let config = load_config(config.as_deref())?;
            let field = HeightField::generate(&config.terrain, seed)
                .context("height field generation failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&field)?);
            } else {
                let (lo, hi) = field.height_bounds();
                println!("Height field: seed={seed}");
                println!("  samples: {}", field.len());
                println!("  x: {:.2} .. {:.2} m", field.start_x(), field.end_x());
                println!("  y: {lo:.2} .. {hi:.2} m");
                let segments = field.last_index().div_ceil(config.stream.segment_size);
                println!(
                    "  segments: {segments} of up to {} samples",
                    config.stream.segment_size + 1
                );
            }
        }
        Commands::Run {
            ticks,
            seed,
            fps,
            config,
            accelerate,
            surface,
        } => {
            anyhow::ensure!(fps.is_finite() && fps > 0.0, "fps must be positive, got {fps}");
            let (width, height) = parse_surface(&surface)?;
            let mut config = load_config(config.as_deref())?;
            if let Some(seed) = seed {
                config.seed = seed;
            }

            tracing::info!(seed = config.seed, ticks, fps, width, height, "starting headless run");
            let mut world = World::with_rapier(config).context("world creation failed")?;
            world.resize(width, height);
            world.spawn_player()?;
            world.set_accelerate(accelerate);

            let dt = 1.0 / fps;
            for _ in 0..ticks {
                let report = world.tick(dt)?;
                if let Some(reason) = report.game_over {
                    println!("Game over at tick {}: {reason}", report.tick);
                    break;
                }
            }

            let events = world.drain_events();
            let count = |f: fn(&WorldEvent) -> bool| events.iter().filter(|e| f(e)).count();
            println!(
                "Ran {} ticks: {} segments built, {} retired, boundary set: {}",
                world.current_tick(),
                count(|e| matches!(e, WorldEvent::SegmentMaterialized { .. })),
                count(|e| matches!(e, WorldEvent::SegmentRetired { .. })),
                count(|e| matches!(e, WorldEvent::BoundarySet { .. })) > 0
            );
            if let Some(p) = world.player_position() {
                println!("Player at ({:.2}, {:.2})", p.x, p.y);
            }
            let timer = world.frame_timer();
            println!(
                "Tick time: avg {:?}, max {:?} over last {}",
                timer.average(),
                timer.max(),
                timer.count()
            );

            let frame = world.frame();
            let draw = DrawListBuilder::culled().render(&frame);
            println!(
                "Draw list: {} meshes, {} sprites, hud offset {:.2}",
                draw.meshes.len(),
                draw.sprites.len(),
                draw.hud_offset
            );
            let renderer = DebugTextRenderer {
                verbose: cli.verbose,
            };
            print!("{}", renderer.render(&frame));
            println!(
                "Terrain camera left edge: {:.1} px",
                world.camera(CameraId::Terrain).left_edge()
            );
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<WorldConfig> {
    let Some(path) = path else {
        return Ok(WorldConfig::default());
    };
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    WorldConfig::from_yaml_str(&yaml).with_context(|| format!("invalid config {}", path.display()))
}

fn parse_surface(surface: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = surface
        .split_once('x')
        .with_context(|| format!("surface must look like 800x480, got {surface}"))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}
