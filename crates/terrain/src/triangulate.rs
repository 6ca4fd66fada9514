//! Constrained Delaunay triangulation of simple polygons.
//!
//! Converts a closed terrain outline into a flat triangle index list for the
//! renderer. Works with either winding; a trailing vertex equal to the first
//! is treated as the explicit closing vertex and is never referenced.

use std::collections::HashMap;

use glam::Vec2;
use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};

use crate::error::TerrainError;

type Cdt = ConstrainedDelaunayTriangulation<Point2<f64>>;

/// Triangulate a simple polygon, returning indices into `polygon` in groups of three.
pub fn triangulate(polygon: &[Vec2]) -> Result<Vec<u32>, TerrainError> {
    let points = open_outline(polygon);
    let n = points.len();
    if n < 3 {
        return Err(TerrainError::Triangulation(format!(
            "need at least 3 vertices, got {n}"
        )));
    }
    if signed_area(points).abs() <= f32::EPSILON {
        return Err(TerrainError::Triangulation("polygon has zero area".into()));
    }
    if has_self_intersections(points) {
        return Err(TerrainError::Triangulation("outline is not simple".into()));
    }

    let (cdt, handles) = build_constrained_cdt(points)?;
    let indices = interior_triangles(&cdt, &handles, points);
    if indices.is_empty() {
        return Err(TerrainError::Triangulation("no triangles produced".into()));
    }
    Ok(indices)
}

/// Inserts every vertex and constrains each outline edge.
fn build_constrained_cdt(points: &[Vec2]) -> Result<(Cdt, Vec<FixedVertexHandle>), TerrainError> {
    let mut cdt = Cdt::new();
    let handles = points
        .iter()
        .map(|v| {
            cdt.insert(Point2::new(f64::from(v.x), f64::from(v.y)))
                .map_err(|e| TerrainError::Triangulation(format!("vertex {v}: {e:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (i, &from) in handles.iter().enumerate() {
        let to = handles[(i + 1) % handles.len()];
        // Repeated vertices collapse onto one handle.
        if from != to {
            cdt.add_constraint(from, to);
        }
    }
    Ok((cdt, handles))
}

/// Faces of the hull that lie inside the outline, as polygon indices.
fn interior_triangles(cdt: &Cdt, handles: &[FixedVertexHandle], points: &[Vec2]) -> Vec<u32> {
    let mut index_of = HashMap::with_capacity(handles.len());
    for (i, &handle) in handles.iter().enumerate() {
        index_of.entry(handle).or_insert(i as u32);
    }

    let mut indices = Vec::with_capacity((points.len() - 2) * 3);
    for face in cdt.inner_faces() {
        let vertices = face.vertices();
        let centroid = vertices
            .iter()
            .map(|v| {
                let p = v.position();
                Vec2::new(p.x as f32, p.y as f32)
            })
            .sum::<Vec2>()
            / 3.0;
        if !point_in_polygon(centroid, points) {
            continue;
        }
        let corners = vertices.map(|v| index_of.get(&v.fix()).copied());
        if let [Some(a), Some(b), Some(c)] = corners {
            indices.extend_from_slice(&[a, b, c]);
        }
    }
    indices
}

/// Checks whether any two non-adjacent edges of the closed outline cross.
pub fn has_self_intersections(polygon: &[Vec2]) -> bool {
    let points = open_outline(polygon);
    let n = points.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let a1 = points[i];
        let a2 = points[(i + 1) % n];
        for j in (i + 2)..n {
            // The last edge shares a vertex with the first.
            if i == 0 && j == n - 1 {
                continue;
            }
            let b1 = points[j];
            let b2 = points[(j + 1) % n];
            if segments_cross(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

/// Signed area of the outline; positive for counter-clockwise winding.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        / 2.0
}

fn open_outline(polygon: &[Vec2]) -> &[Vec2] {
    match polygon {
        [first, .., last] if polygon.len() > 3 && first == last => &polygon[..polygon.len() - 1],
        _ => polygon,
    }
}

/// Even-odd ray cast towards +x.
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (vi, vj) = (polygon[i], polygon[j]);
        if (vi.y > point.y) != (vj.y > point.y)
            && point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Proper crossing of two segments; touching endpoints do not count.
fn segments_cross(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = cross(b2 - b1, a1 - b1);
    let d2 = cross(b2 - b1, a2 - b1);
    let d3 = cross(a2 - a1, b1 - a1);
    let d4 = cross(a2 - a1, b2 - a1);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}
