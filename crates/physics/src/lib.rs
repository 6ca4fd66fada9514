//! Physics seam for the runtime core.
//!
//! The core talks to a [`PhysicsBackend`]; [`RapierPhysics`] is the real
//! engine and [`ScriptedPhysics`] is a collision-free stand-in for headless
//! runs and tests. [`FixedStepper`] turns frame time into fixed steps.

mod backend;
mod rapier;
mod scripted;
mod stepper;

pub use backend::{BallDesc, BodyHandle, PhysicsBackend, PhysicsError};
pub use rapier::RapierPhysics;
pub use scripted::{DynamicState, ScriptedBody, ScriptedPhysics};
pub use stepper::{FixedStepper, PhysicsConfig, StepMode};
