use std::hint::black_box;
use std::time::Instant;

use glam::Vec2;
use hillroll_camera::{CameraConfig, CameraRig};
use hillroll_ecs::ComponentStore;
use hillroll_physics::ScriptedPhysics;
use hillroll_stream::{StreamConfig, TerrainStream};
use hillroll_terrain::{HeightField, HeightFieldConfig, SegmentBuilder};

fn make_stream(iterations: u32, blocks: u32, config: StreamConfig) -> TerrainStream {
    let field_config = HeightFieldConfig {
        iterations,
        blocks,
        ..HeightFieldConfig::default()
    };
    let field = match HeightField::generate(&field_config, 7) {
        Ok(field) => field,
        Err(e) => panic!("height field generation failed: {e}"),
    };
    let builder = match SegmentBuilder::uniform(128.0) {
        Ok(builder) => builder,
        Err(e) => panic!("segment builder: {e}"),
    };
    TerrainStream::new(field, builder, config)
}

fn bench_generate(iterations: u32, runs: usize) {
    let config = HeightFieldConfig {
        iterations,
        ..HeightFieldConfig::default()
    };
    let start = Instant::now();
    for seed in 0..runs {
        let _ = black_box(HeightField::generate(black_box(&config), seed as u64));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / runs as u32;
    println!("  generate (2^{iterations}+1 samples, {runs} runs): {per_iter:?}/run, total {elapsed:?}");
}

/// Sweep the camera across the whole field, one tick per step.
fn bench_sweep(iterations: u32, blocks: u32, retire: bool, step: f32) {
    let config = StreamConfig {
        retire,
        ..StreamConfig::default()
    };
    let mut stream = make_stream(iterations, blocks, config);
    let mut rig = CameraRig::new(&CameraConfig::default());
    let mut physics = ScriptedPhysics::new();
    let mut store = ComponentStore::new();

    let end_x = stream.height_field().end_x();
    let mut x = 5.0;
    let mut ticks = 0u32;
    let start = Instant::now();
    while x < end_x {
        rig.follow(Vec2::new(x, 0.0), 1.0 / 60.0);
        let _ = black_box(stream.update(&mut rig, &mut physics, &mut store));
        x += step;
        ticks += 1;
    }
    let elapsed = start.elapsed();
    let per_tick = elapsed / ticks.max(1);
    let stats = stream.stats();
    println!(
        "  sweep (2^{iterations} x {blocks} blocks, retire={retire}, {ticks} ticks): {per_tick:?}/tick, \
         built {}, retired {}, live {}",
        stats.materialized_total, stats.retired_total, stats.live_segments
    );
}

fn main() {
    println!("=== Terrain Stream Benchmarks ===\n");

    println!("Height field generation:");
    bench_generate(8, 1000);
    bench_generate(11, 100);
    bench_generate(14, 10);

    println!("\nCamera sweep:");
    bench_sweep(11, 1, true, 0.1);
    bench_sweep(11, 4, true, 0.1);
    bench_sweep(11, 4, false, 0.1);
    bench_sweep(11, 4, true, 2.0);

    println!("\n=== Done ===");
}
