//! Terrain streaming: a sliding window of live segments over the height field.
//!
//! # Invariants
//! - The cursor never decreases; a segment is never materialized twice.
//! - Adjacent segments share exactly one sample, so the union of all
//!   materialized ranges covers the field once.
//! - The camera right boundary is set at most once per stream.
//! - Retiring a segment releases its entity and its physics body together.

mod config;
mod stats;
mod window;

pub use config::StreamConfig;
pub use stats::{FrameTimer, StreamStats};
pub use window::{LiveSegment, SegmentRange, StreamError, StreamUpdate, TerrainStream};
