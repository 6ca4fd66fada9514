use std::collections::BTreeMap;

use glam::Vec2;

use crate::backend::{
    BallDesc, BodyHandle, PhysicsBackend, PhysicsError, check_ball, check_polyline,
};

/// A body in the scripted world.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedBody {
    Static { vertices: Vec<Vec2> },
    Dynamic(DynamicState),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub force: Vec2,
    pub mass: f32,
}

/// Collision-free backend with explicit Euler integration.
///
/// Used for headless runs and tests where bodies are driven by script rather
/// than contacts: positions and velocities can be set directly, and every
/// created polyline is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPhysics {
    gravity: Vec2,
    bodies: BTreeMap<BodyHandle, ScriptedBody>,
    next_handle: u64,
    elapsed: f32,
    steps: u64,
}

impl ScriptedPhysics {
    /// A world without gravity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&ScriptedBody> {
        self.bodies.get(&handle)
    }

    /// Vertices of a static polyline body.
    pub fn polyline(&self, handle: BodyHandle) -> Option<&[Vec2]> {
        match self.bodies.get(&handle) {
            Some(ScriptedBody::Static { vertices }) => Some(vertices),
            _ => None,
        }
    }

    pub fn static_count(&self) -> usize {
        self.bodies
            .values()
            .filter(|b| matches!(b, ScriptedBody::Static { .. }))
            .count()
    }

    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(state) = self.dynamic_mut(handle) {
            state.position = position;
        }
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(state) = self.dynamic_mut(handle) {
            state.velocity = velocity;
        }
    }

    pub fn set_angle(&mut self, handle: BodyHandle, angle: f32) {
        if let Some(state) = self.dynamic_mut(handle) {
            state.angle = angle;
        }
    }

    /// Total simulated time.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of `step` calls so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn dynamic_mut(&mut self, handle: BodyHandle) -> Option<&mut DynamicState> {
        match self.bodies.get_mut(&handle) {
            Some(ScriptedBody::Dynamic(state)) => Some(state),
            _ => None,
        }
    }

    fn insert(&mut self, body: ScriptedBody) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, body);
        handle
    }
}

impl PhysicsBackend for ScriptedPhysics {
    fn create_static_polyline(&mut self, vertices: &[Vec2]) -> Result<BodyHandle, PhysicsError> {
        check_polyline(vertices)?;
        Ok(self.insert(ScriptedBody::Static {
            vertices: vertices.to_vec(),
        }))
    }

    fn create_dynamic_ball(&mut self, desc: BallDesc) -> Result<BodyHandle, PhysicsError> {
        check_ball(&desc)?;
        let mass = desc.density * std::f32::consts::PI * desc.radius * desc.radius;
        Ok(self.insert(ScriptedBody::Dynamic(DynamicState {
            position: desc.position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            force: Vec2::ZERO,
            mass: mass.max(f32::EPSILON),
        })))
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies.remove(&handle).is_some()
    }

    fn step(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if let ScriptedBody::Dynamic(state) = body {
                state.velocity += (gravity + state.force / state.mass) * dt;
                state.position += state.velocity * dt;
            }
        }
        self.elapsed += dt;
        self.steps += 1;
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        match self.bodies.get(&handle)? {
            ScriptedBody::Static { .. } => Some(Vec2::ZERO),
            ScriptedBody::Dynamic(state) => Some(state.position),
        }
    }

    fn angle(&self, handle: BodyHandle) -> Option<f32> {
        match self.bodies.get(&handle)? {
            ScriptedBody::Static { .. } => Some(0.0),
            ScriptedBody::Dynamic(state) => Some(state.angle),
        }
    }

    fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        match self.bodies.get(&handle)? {
            ScriptedBody::Static { .. } => Some(Vec2::ZERO),
            ScriptedBody::Dynamic(state) => Some(state.velocity),
        }
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(state) = self.dynamic_mut(handle) {
            state.force = force;
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_polylines_are_kept_verbatim() {
        let mut physics = ScriptedPhysics::new();
        let line = [Vec2::new(0.0, 1.0), Vec2::new(1.0, 2.0)];
        let h = physics.create_static_polyline(&line).unwrap();
        assert_eq!(physics.polyline(h), Some(&line[..]));
        assert_eq!(physics.static_count(), 1);
    }

    #[test]
    fn velocity_integrates_position() {
        let mut physics = ScriptedPhysics::new();
        let ball = physics.create_dynamic_ball(BallDesc::default()).unwrap();
        physics.set_velocity(ball, Vec2::new(2.0, 0.0));
        for _ in 0..10 {
            physics.step(0.1);
        }
        let p = physics.position(ball).unwrap();
        assert!((p.x - 2.0).abs() < 1e-4);
        assert_eq!(physics.steps(), 10);
        assert!((physics.elapsed() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn gravity_pulls_down() {
        let mut physics = ScriptedPhysics::with_gravity(Vec2::new(0.0, -10.0));
        let ball = physics.create_dynamic_ball(BallDesc::default()).unwrap();
        physics.step(1.0);
        assert_eq!(physics.linear_velocity(ball), Some(Vec2::new(0.0, -10.0)));
    }

    #[test]
    fn force_accelerates_by_mass() {
        let mut physics = ScriptedPhysics::new();
        let ball = physics.create_dynamic_ball(BallDesc::default()).unwrap();
        let mass = std::f32::consts::PI * 0.25 * 0.25;
        physics.apply_force(ball, Vec2::new(mass, 0.0));
        physics.step(1.0);
        let v = physics.linear_velocity(ball).unwrap();
        assert!((v.x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn remove_and_count() {
        let mut physics = ScriptedPhysics::new();
        let a = physics.create_dynamic_ball(BallDesc::default()).unwrap();
        let b = physics
            .create_static_polyline(&[Vec2::ZERO, Vec2::X])
            .unwrap();
        assert_eq!(physics.body_count(), 2);
        assert!(physics.remove_body(b));
        assert!(!physics.remove_body(b));
        assert_eq!(physics.body_count(), 1);
        assert!(physics.position(a).is_some());
    }
}
