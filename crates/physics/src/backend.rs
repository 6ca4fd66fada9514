use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque reference to a rigid body owned by a [`PhysicsBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

/// Errors from body creation.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("polyline needs at least 2 vertices, got {0}")]
    EmptyPolyline(usize),
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Description of a dynamic circular body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallDesc {
    pub position: Vec2,
    pub radius: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for BallDesc {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            radius: 0.25,
            density: 1.0,
            friction: 0.5,
            restitution: 0.6,
        }
    }
}

/// The physics engine as seen by the runtime core.
///
/// Only what the core needs: static ground from a polyline, a dynamic body to
/// follow, fixed stepping, and read-back of position and orientation.
pub trait PhysicsBackend {
    /// Create a static body whose one-sided collision surface is the open
    /// polyline through `vertices`, in world units.
    fn create_static_polyline(&mut self, vertices: &[Vec2]) -> Result<BodyHandle, PhysicsError>;

    /// Create a dynamic ball.
    fn create_dynamic_ball(&mut self, desc: BallDesc) -> Result<BodyHandle, PhysicsError>;

    /// Remove a body and everything attached to it. Returns false for unknown handles.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f32);

    fn position(&self, handle: BodyHandle) -> Option<Vec2>;

    /// Orientation in radians.
    fn angle(&self, handle: BodyHandle) -> Option<f32>;

    fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec2>;

    /// Replace the force acting on the body's center for the coming steps.
    fn apply_force(&mut self, handle: BodyHandle, force: Vec2);

    /// Number of live bodies.
    fn body_count(&self) -> usize;
}

pub(crate) fn check_polyline(vertices: &[Vec2]) -> Result<(), PhysicsError> {
    if vertices.len() < 2 {
        return Err(PhysicsError::EmptyPolyline(vertices.len()));
    }
    if vertices.iter().any(|v| !v.is_finite()) {
        return Err(PhysicsError::NonFinite("polyline"));
    }
    Ok(())
}

pub(crate) fn check_ball(desc: &BallDesc) -> Result<(), PhysicsError> {
    let finite = desc.position.is_finite()
        && desc.radius.is_finite()
        && desc.density.is_finite()
        && desc.friction.is_finite()
        && desc.restitution.is_finite();
    if !finite {
        return Err(PhysicsError::NonFinite("ball description"));
    }
    Ok(())
}
