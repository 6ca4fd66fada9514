use std::fmt::Write;

use hillroll_ecs::Drawable;
use hillroll_kernel::Frame;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads a frame and produces output. It never mutates the world.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    fn render(&self, frame: &Frame<'_>) -> Self::Output;
}

/// Human-readable dump of a frame, for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// List every drawable entity, not just the summary.
    pub verbose: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &Frame<'_>) -> String {
        let mut out = String::new();
        let stream = frame.stream;
        // Writing into a String cannot fail.
        let _ = writeln!(out, "=== Frame (tick={}) ===", frame.tick);
        let _ = writeln!(
            out,
            "Stream: live={} cursor={} built={} retired={} end_of_field={}{}",
            stream.live_segments,
            stream.cursor,
            stream.materialized_total,
            stream.retired_total,
            stream.end_of_field,
            if stream.over_limit { " OVER LIMIT" } else { "" }
        );

        for (id, camera) in frame.cameras.iter() {
            let view = camera.world_view();
            let _ = writeln!(
                out,
                "Camera {id}: center=({:.2}, {:.2}) view=[{:.2}, {:.2}] upm={}",
                camera.position().x,
                camera.position().y,
                view.min.x,
                view.max.x,
                camera.units_per_meter()
            );
        }

        let _ = writeln!(out, "Entities: {}", frame.store.len());
        if let Some(player) = frame.player {
            if let Some(t) = frame.store.transform(player) {
                let _ = writeln!(
                    out,
                    "Player [{player}]: pos=({:.2}, {:.2}) angle={:.1}deg",
                    t.position.x,
                    t.position.y,
                    t.angle_degrees()
                );
            }
        }

        if self.verbose {
            let drawables = frame.store.matching(hillroll_ecs::ComponentMask::DRAWABLE);
            for entity in drawables {
                match frame.store.drawable(entity) {
                    Some(Drawable::Mesh(mesh)) => {
                        let _ = writeln!(
                            out,
                            "  [{entity}] mesh vertices={} triangles={}",
                            mesh.vertices.len(),
                            mesh.triangle_count()
                        );
                    }
                    Some(Drawable::Sprite { size }) => {
                        let _ = writeln!(out, "  [{entity}] sprite {:.2}x{:.2}", size.x, size.y);
                    }
                    None => {}
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hillroll_kernel::{World, WorldConfig};
    use hillroll_physics::ScriptedPhysics;

    fn world() -> World<ScriptedPhysics> {
        World::new(WorldConfig::default(), ScriptedPhysics::new()).unwrap()
    }

    #[test]
    fn empty_world() {
        let w = world();
        let output = DebugTextRenderer::new().render(&w.frame());
        assert!(output.contains("tick=0"));
        assert!(output.contains("Entities: 0"));
        assert!(output.contains("Camera standard"));
        assert!(output.contains("Camera terrain"));
    }

    #[test]
    fn after_a_tick() {
        let mut w = world();
        w.spawn_player().unwrap();
        w.tick(1.0 / 60.0).unwrap();
        let output = DebugTextRenderer::new().render(&w.frame());
        assert!(output.contains("tick=1"));
        assert!(output.contains("Player ["));
        assert!(!output.contains("mesh vertices"));

        let verbose = DebugTextRenderer::verbose().render(&w.frame());
        assert!(verbose.contains("mesh vertices="));
        assert!(verbose.contains("sprite 0.50x0.50"));
    }
}
