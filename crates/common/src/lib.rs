//! Shared types for the hillroll runtime: entity ids and 2D transforms.

mod types;

pub use types::{EntityId, Transform2D};
