/// Errors from height field construction, triangulation and segment building.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error("invalid height field: {0}")]
    InvalidHeightField(String),
    #[error("invalid terrain segment starting at x={start_x}: {reason}")]
    InvalidSegment { start_x: f32, reason: String },
    #[error("pixels per meter must be finite and positive, got {0}")]
    InvalidScale(glam::Vec2),
    #[error("triangulation failed: {0}")]
    Triangulation(String),
}
