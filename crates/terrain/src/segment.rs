use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::triangulate::{has_self_intersections, triangulate};

/// Number of synthetic vertices appended to a ground line to close it:
/// bottom-right, bottom-left and the repeated first sample.
pub const CLOSING_VERTICES: usize = 3;

/// Drawable terrain geometry in texture pixel units.
///
/// `vertices` is the closed outline (ground line, two base corners, closing
/// vertex); `indices` lists triangles into it, three at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainMesh {
    pub vertices: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Collision and render geometry built from one height-field slice.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSegment {
    /// Ground line in world units, exactly the input slice.
    pub polyline: Vec<Vec2>,
    pub mesh: TerrainMesh,
}

/// Converts height-field slices into collision polylines and textured meshes.
///
/// The pixel scale is fixed at construction so that a repeating ground
/// texture tiles at the same real-world spacing for every segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentBuilder {
    pixels_per_meter: Vec2,
}

impl SegmentBuilder {
    /// Fails unless both axes have a finite, positive scale.
    pub fn new(pixels_per_meter: Vec2) -> Result<Self, TerrainError> {
        if !(pixels_per_meter.is_finite() && pixels_per_meter.cmpgt(Vec2::ZERO).all()) {
            return Err(TerrainError::InvalidScale(pixels_per_meter));
        }
        Ok(Self { pixels_per_meter })
    }

    pub fn uniform(pixels_per_meter: f32) -> Result<Self, TerrainError> {
        Self::new(Vec2::splat(pixels_per_meter))
    }

    pub fn pixels_per_meter(&self) -> Vec2 {
        self.pixels_per_meter
    }

    /// Build the collision polyline and drawable mesh for `slice`.
    ///
    /// Degenerate slices are rejected with [`TerrainError::InvalidSegment`]
    /// before the triangulator ever sees them.
    pub fn build(&self, slice: &[Vec2]) -> Result<BuiltSegment, TerrainError> {
        validate_slice(slice)?;

        let outline = close_outline(slice);
        let start_x = slice[0].x;
        if distinct_vertices(&outline[..outline.len() - 1]) < 3 {
            return Err(invalid(start_x, "fewer than 3 distinct outline vertices"));
        }
        if has_self_intersections(&outline) {
            return Err(invalid(start_x, "outline intersects itself"));
        }

        let vertices: Vec<Vec2> = outline.iter().map(|v| *v * self.pixels_per_meter).collect();
        let indices = triangulate(&vertices)?;

        Ok(BuiltSegment {
            polyline: slice.to_vec(),
            mesh: TerrainMesh { vertices, indices },
        })
    }
}

/// Append the base corners and the closing vertex to a ground line.
pub fn close_outline(slice: &[Vec2]) -> Vec<Vec2> {
    let mut outline = Vec::with_capacity(slice.len() + CLOSING_VERTICES);
    outline.extend_from_slice(slice);
    if let (Some(&first), Some(&last)) = (slice.first(), slice.last()) {
        outline.push(Vec2::new(last.x, 0.0));
        outline.push(Vec2::new(first.x, 0.0));
        outline.push(first);
    }
    outline
}

fn validate_slice(slice: &[Vec2]) -> Result<(), TerrainError> {
    let start_x = slice.first().map(|v| v.x).unwrap_or(f32::NAN);
    if slice.len() < 2 {
        return Err(invalid(
            start_x,
            &format!("needs at least 2 samples, got {}", slice.len()),
        ));
    }
    if slice.iter().any(|v| !v.is_finite()) {
        return Err(invalid(start_x, "contains non-finite samples"));
    }
    if slice.windows(2).any(|w| w[1].x <= w[0].x) {
        return Err(invalid(start_x, "x is not strictly increasing"));
    }
    Ok(())
}

fn distinct_vertices(points: &[Vec2]) -> usize {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    sorted.len()
}

fn invalid(start_x: f32, reason: &str) -> TerrainError {
    TerrainError::InvalidSegment {
        start_x,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice() -> Vec<Vec2> {
        vec![
            Vec2::new(1.0, 2.0),
            Vec2::new(1.5, 2.5),
            Vec2::new(2.0, 1.5),
            Vec2::new(2.5, 2.0),
        ]
    }

    #[test]
    fn polyline_is_the_slice_verbatim() {
        let built = SegmentBuilder::uniform(1.0).unwrap().build(&slice()).unwrap();
        assert_eq!(built.polyline, slice());
    }

    #[test]
    fn mesh_appends_base_corners_and_closing_vertex() {
        let built = SegmentBuilder::uniform(1.0).unwrap().build(&slice()).unwrap();
        let v = &built.mesh.vertices;
        assert_eq!(v.len(), 4 + CLOSING_VERTICES);
        assert_eq!(v[4], Vec2::new(2.5, 0.0));
        assert_eq!(v[5], Vec2::new(1.0, 0.0));
        assert_eq!(v[6], Vec2::new(1.0, 2.0));
        // Ground line with 4 samples plus 2 corners: 4 triangles.
        assert_eq!(built.mesh.triangle_count(), 4);
        assert!(built.mesh.indices.iter().all(|&i| (i as usize) < v.len() - 1));
    }

    #[test]
    fn mesh_scales_axes_independently() {
        let builder = SegmentBuilder::new(Vec2::new(100.0, 50.0)).unwrap();
        let built = builder.build(&slice()).unwrap();
        assert_eq!(built.mesh.vertices[0], Vec2::new(100.0, 100.0));
        assert_eq!(built.mesh.vertices[4], Vec2::new(250.0, 0.0));
        // Collision geometry stays in world units.
        assert_eq!(built.polyline[0], Vec2::new(1.0, 2.0));
    }

    #[test]
    fn two_sample_slice_builds_a_quad() {
        let built = SegmentBuilder::uniform(2.0)
            .unwrap()
            .build(&[Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)])
            .unwrap();
        assert_eq!(built.mesh.triangle_count(), 2);
    }

    #[test]
    fn single_sample_is_invalid() {
        let err = SegmentBuilder::uniform(1.0)
            .unwrap()
            .build(&[Vec2::new(0.0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, TerrainError::InvalidSegment { .. }));
        assert!(err.to_string().contains("invalid terrain segment"));
    }

    #[test]
    fn ground_on_the_base_is_invalid() {
        let err = SegmentBuilder::uniform(1.0)
            .unwrap()
            .build(&[Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)])
            .unwrap_err();
        assert!(matches!(err, TerrainError::InvalidSegment { .. }));
    }

    #[test]
    fn ground_below_the_base_is_invalid() {
        let err = SegmentBuilder::uniform(1.0)
            .unwrap()
            .build(&[
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, -1.0),
                Vec2::new(2.0, 1.0),
            ])
            .unwrap_err();
        assert!(matches!(err, TerrainError::InvalidSegment { .. }));
    }

    #[test]
    fn decreasing_x_is_invalid() {
        let err = SegmentBuilder::uniform(1.0)
            .unwrap()
            .build(&[Vec2::new(1.0, 1.0), Vec2::new(0.5, 1.0)])
            .unwrap_err();
        assert!(matches!(err, TerrainError::InvalidSegment { .. }));
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        for ppm in [Vec2::new(0.0, 1.0), Vec2::new(1.0, -2.0), Vec2::splat(f32::NAN)] {
            assert!(matches!(
                SegmentBuilder::new(ppm),
                Err(TerrainError::InvalidScale(_))
            ));
        }
        assert!(SegmentBuilder::uniform(0.0).is_err());
        assert!(SegmentBuilder::uniform(128.0).is_ok());
    }

    #[test]
    fn close_outline_of_empty_slice_is_empty() {
        assert!(close_outline(&[]).is_empty());
    }
}
