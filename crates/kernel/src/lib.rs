//! World kernel: owns every runtime system and sequences them each tick.
//!
//! # Invariants
//! - There is no global state; a [`World`] is the whole context.
//! - Each tick runs physics, then streaming, then cameras, then the game-over
//!   check, strictly in that order.
//! - The height field is regenerated from the configured seed; nothing is
//!   persisted between runs.

pub mod config;
mod frame;
pub mod outcome;
pub mod world;

pub use config::{ConfigError, PlayerConfig, WorldConfig};
pub use frame::Frame;
pub use outcome::{GameOverReason, GameOverRule};
pub use world::{EVENT_LOG_CAPACITY, TickReport, World, WorldError, WorldEvent};
