use glam::{Mat4, Vec2};

use hillroll_camera::CameraId;
use hillroll_common::EntityId;
use hillroll_ecs::{ComponentMask, Drawable};
use hillroll_kernel::Frame;

use crate::renderer::Renderer;

/// One terrain mesh, in terrain texture pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDraw {
    pub entity: EntityId,
    pub vertices: Vec<Vec2>,
    pub indices: Vec<u32>,
}

/// One sprite, centered on its body, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDraw {
    pub entity: EntityId,
    pub center: Vec2,
    pub size: Vec2,
    pub angle_degrees: f32,
}

/// Everything a GPU backend needs to draw a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub terrain_view_projection: Mat4,
    pub sprite_view_projection: Mat4,
    pub meshes: Vec<MeshDraw>,
    pub sprites: Vec<SpriteDraw>,
    /// Left edge of the standard camera, for screen-fixed overlays.
    pub hud_offset: f32,
}

/// Collects draw calls from a frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawListBuilder {
    /// Skip meshes entirely outside the terrain camera's view.
    pub cull: bool,
}

impl DrawListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn culled() -> Self {
        Self { cull: true }
    }
}

impl Renderer for DrawListBuilder {
    type Output = DrawList;

    fn render(&self, frame: &Frame<'_>) -> DrawList {
        let terrain = frame.cameras.get(CameraId::Terrain);
        let standard = frame.cameras.get(CameraId::Standard);
        let (left, right) = (terrain.left_edge(), terrain.right_edge());

        let mut meshes = Vec::new();
        let mut sprites = Vec::new();
        let mut culled = 0usize;

        for entity in frame.store.matching(ComponentMask::DRAWABLE) {
            match frame.store.drawable(entity) {
                Some(Drawable::Mesh(mesh)) => {
                    let (lo, hi) = x_extent(&mesh.vertices);
                    if self.cull && (hi < left || lo > right) {
                        culled += 1;
                        continue;
                    }
                    meshes.push(MeshDraw {
                        entity,
                        vertices: mesh.vertices.clone(),
                        indices: mesh.indices.clone(),
                    });
                }
                Some(Drawable::Sprite { size }) => {
                    let Some(transform) = frame.store.transform(entity) else {
                        continue;
                    };
                    sprites.push(SpriteDraw {
                        entity,
                        center: transform.position,
                        size: *size,
                        angle_degrees: transform.angle_degrees(),
                    });
                }
                None => {}
            }
        }

        tracing::trace!(
            meshes = meshes.len(),
            sprites = sprites.len(),
            culled,
            "draw list built"
        );

        DrawList {
            terrain_view_projection: terrain.view_projection(),
            sprite_view_projection: standard.view_projection(),
            meshes,
            sprites,
            hud_offset: standard.hud_offset(),
        }
    }
}

fn x_extent(vertices: &[Vec2]) -> (f32, f32) {
    vertices
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v.x), hi.max(v.x))
        })
}
