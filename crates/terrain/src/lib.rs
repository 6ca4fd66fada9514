//! Terrain: fractal height fields and the geometry built from them.
//!
//! # Invariants
//! - A height field is generated once per world and never mutated.
//! - Generation is fully determined by its config and seed.
//! - A segment's collision polyline is exactly its slice of the field; only
//!   the drawable mesh gains the closing vertices.

mod error;
mod field;
pub mod midpoint;
mod segment;
pub mod triangulate;

pub use error::TerrainError;
pub use field::{HeightField, HeightFieldConfig, MAX_ITERATIONS};
pub use segment::{BuiltSegment, CLOSING_VERTICES, SegmentBuilder, TerrainMesh, close_outline};
pub use triangulate::triangulate;
