//! Typed dense component storage.
//!
//! Each component type has its own column, a `Vec<Option<T>>` indexed by
//! [`EntityId::slot`]. A [`ComponentMask`] per slot records which columns are
//! populated so per-tick systems can select entities without probing every
//! column.
//!
//! # Invariants
//! - A component is only ever stored for a live entity.
//! - `mask(e)` has a bit set exactly when the matching column holds a value.
//! - Despawned slots are reused with a bumped generation; stale ids are
//!   rejected by every accessor.
//! - Iteration is in slot order, which is deterministic.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use hillroll_common::{EntityId, Transform2D};
use hillroll_physics::BodyHandle;
use hillroll_terrain::TerrainMesh;

bitflags! {
    /// Which components an entity carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentMask: u32 {
        const PHYSICS_BODY = 1 << 0;
        const DRAWABLE = 1 << 1;
        const TRANSFORM = 1 << 2;
        const MOTION = 1 << 3;
        const PLAYER_CONTROL = 1 << 4;
        /// Marker: the entity the cameras follow.
        const MAIN_PLAYER = 1 << 5;
    }
}

/// Link from an entity to its rigid body in the physics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicsBody(pub BodyHandle);

/// Something the renderer can draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Drawable {
    /// A textured quad of `size` meters, placed by the entity's transform.
    Sprite { size: Vec2 },
    /// A terrain mesh in texture pixel units.
    Mesh(TerrainMesh),
}

/// Force applied to the entity's body before every physics step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Motion {
    pub force: Vec2,
}

/// Player intent: positive accelerates forward, negative backward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerControl {
    pub accelerate: f32,
}

#[derive(Debug, Clone)]
struct Column<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Column<T> {
    fn insert(&mut self, slot: usize, value: T) {
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        self.slots[slot] = Some(value);
    }

    fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn remove(&mut self, slot: usize) -> Option<T> {
        self.slots.get_mut(slot).and_then(Option::take)
    }
}

/// Dense storage for every component type in the game.
#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    generations: Vec<u32>,
    masks: Vec<Option<ComponentMask>>,
    free: Vec<u32>,
    live: usize,
    bodies: Column<PhysicsBody>,
    drawables: Column<Drawable>,
    transforms: Column<Transform2D>,
    motions: Column<Motion>,
    controls: Column<PlayerControl>,
}

macro_rules! component_accessors {
    ($column:ident, $ty:ty, $bit:expr, $set:ident, $get:ident, $get_mut:ident, $remove:ident) => {
        /// Attach the component, replacing any previous value. Returns false
        /// if the entity is not alive.
        pub fn $set(&mut self, entity: EntityId, value: $ty) -> bool {
            if !self.mark(entity, $bit) {
                return false;
            }
            self.$column.insert(entity.slot(), value);
            true
        }

        pub fn $get(&self, entity: EntityId) -> Option<&$ty> {
            if !self.is_alive(entity) {
                return None;
            }
            self.$column.get(entity.slot())
        }

        pub fn $get_mut(&mut self, entity: EntityId) -> Option<&mut $ty> {
            if !self.is_alive(entity) {
                return None;
            }
            self.$column.get_mut(entity.slot())
        }

        pub fn $remove(&mut self, entity: EntityId) -> Option<$ty> {
            if !self.unmark(entity, $bit) {
                return None;
            }
            self.$column.remove(entity.slot())
        }
    };
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity with no components, reusing a free slot if any.
    pub fn spawn(&mut self) -> EntityId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.masks[slot] = Some(ComponentMask::empty());
            return EntityId::new(index, self.generations[slot]);
        }
        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.masks.push(Some(ComponentMask::empty()));
        EntityId::new(index, 0)
    }

    /// Remove the entity and all of its components.
    ///
    /// Returns the physics body the entity owned, if any, so the caller can
    /// release it from the backend. Despawning a dead id does nothing.
    pub fn despawn(&mut self, entity: EntityId) -> Option<BodyHandle> {
        if !self.is_alive(entity) {
            tracing::trace!(%entity, "despawn of dead entity ignored");
            return None;
        }
        let slot = entity.slot();
        let body = self.bodies.remove(slot).map(|b| b.0);
        self.drawables.remove(slot);
        self.transforms.remove(slot);
        self.motions.remove(slot);
        self.controls.remove(slot);

        self.masks[slot] = None;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(entity.index);
        self.live -= 1;
        body
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        let slot = entity.slot();
        matches!(self.masks.get(slot), Some(Some(_)))
            && self.generations.get(slot) == Some(&entity.generation)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn mask(&self, entity: EntityId) -> ComponentMask {
        if !self.is_alive(entity) {
            return ComponentMask::empty();
        }
        self.masks[entity.slot()].unwrap_or_default()
    }

    /// Live entities carrying every component in `required`, in slot order.
    pub fn matching(&self, required: ComponentMask) -> impl Iterator<Item = EntityId> + '_ {
        self.masks
            .iter()
            .enumerate()
            .filter_map(move |(slot, mask)| match mask {
                Some(mask) if mask.contains(required) => {
                    Some(EntityId::new(slot as u32, self.generations[slot]))
                }
                _ => None,
            })
    }

    component_accessors!(
        bodies,
        PhysicsBody,
        ComponentMask::PHYSICS_BODY,
        set_physics_body,
        physics_body,
        physics_body_mut,
        remove_physics_body
    );
    component_accessors!(
        drawables,
        Drawable,
        ComponentMask::DRAWABLE,
        set_drawable,
        drawable,
        drawable_mut,
        remove_drawable
    );
    component_accessors!(
        transforms,
        Transform2D,
        ComponentMask::TRANSFORM,
        set_transform,
        transform,
        transform_mut,
        remove_transform
    );
    component_accessors!(
        motions,
        Motion,
        ComponentMask::MOTION,
        set_motion,
        motion,
        motion_mut,
        remove_motion
    );
    component_accessors!(
        controls,
        PlayerControl,
        ComponentMask::PLAYER_CONTROL,
        set_player_control,
        player_control,
        player_control_mut,
        remove_player_control
    );

    /// Tag or untag the entity as the main player.
    pub fn set_main_player(&mut self, entity: EntityId, main: bool) -> bool {
        if main {
            self.mark(entity, ComponentMask::MAIN_PLAYER)
        } else {
            self.unmark(entity, ComponentMask::MAIN_PLAYER)
        }
    }

    /// The first live entity tagged as main player.
    pub fn main_player(&self) -> Option<EntityId> {
        self.matching(ComponentMask::MAIN_PLAYER).next()
    }

    fn mark(&mut self, entity: EntityId, bit: ComponentMask) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        if let Some(mask) = self.masks[entity.slot()].as_mut() {
            mask.insert(bit);
        }
        true
    }

    /// Clears `bit`, returning whether it was set on a live entity.
    fn unmark(&mut self, entity: EntityId, bit: ComponentMask) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        match self.masks[entity.slot()].as_mut() {
            Some(mask) if mask.contains(bit) => {
                mask.remove(bit);
                true
            }
            _ => false,
        }
    }
}
