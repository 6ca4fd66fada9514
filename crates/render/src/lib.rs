//! Rendering hand-off: renderer-agnostic interface over a world [`Frame`].
//!
//! # Invariants
//! - Renderers only read; a frame borrows the world immutably.
//! - Terrain meshes are drawn through the terrain camera, sprites through the
//!   standard camera.
//!
//! [`Frame`]: hillroll_kernel::Frame

mod draw_list;
mod renderer;

pub use draw_list::{DrawList, DrawListBuilder, MeshDraw, SpriteDraw};
pub use renderer::{DebugTextRenderer, Renderer};
