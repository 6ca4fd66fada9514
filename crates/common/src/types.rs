use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Dense identifier for an entity in the component store.
///
/// `index` addresses the storage slot directly. A slot is reused after its
/// entity is despawned, with `generation` bumped so that stale ids held by
/// other systems never alias the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index as a `usize`, for direct indexing into component columns.
    pub fn slot(self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// 2D placement of a body in world units: position plus rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub position: Vec2,
    pub angle: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
        }
    }
}

impl Transform2D {
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            angle: 0.0,
        }
    }

    /// Rotation in degrees, as sprites expect it.
    pub fn angle_degrees(&self) -> f32 {
        self.angle.to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_order_by_index_then_generation() {
        let a = EntityId::new(1, 0);
        let b = EntityId::new(1, 1);
        let c = EntityId::new(2, 0);
        assert!(a < b);
        assert!(b < c);
        assert_ne!(a, b);
    }

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId::new(7, 3).to_string(), "7v3");
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform2D::default();
        assert_eq!(t.position, Vec2::ZERO);
        assert_eq!(t.angle, 0.0);
    }

    #[test]
    fn angle_degrees_converts() {
        let t = Transform2D {
            position: Vec2::ZERO,
            angle: std::f32::consts::PI,
        };
        assert!((t.angle_degrees() - 180.0).abs() < 1e-4);
    }
}
