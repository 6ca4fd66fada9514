use std::collections::BTreeMap;

use glam::Vec2;
use rapier2d::prelude::*;

use crate::backend::{
    BallDesc, BodyHandle, PhysicsBackend, PhysicsError, check_ball, check_polyline,
};

/// Physics backend running a full rapier2d pipeline.
///
/// Handles given out are stable counters mapped onto rapier's own handles,
/// so callers never see rapier types.
pub struct RapierPhysics {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    handles: BTreeMap<BodyHandle, RigidBodyHandle>,
    next_handle: u64,
}

impl RapierPhysics {
    /// Create an empty world with vertical gravity `gravity_y` (m/s²).
    pub fn new(gravity_y: f32) -> Self {
        Self {
            gravity: Vector::new(0.0, gravity_y),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            handles: BTreeMap::new(),
            next_handle: 0,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    /// Number of colliders currently attached to bodies.
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    fn register(&mut self, handle: RigidBodyHandle) -> BodyHandle {
        let id = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(id, handle);
        id
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.handles.get(&handle).and_then(|h| self.bodies.get(*h))
    }
}

impl PhysicsBackend for RapierPhysics {
    fn create_static_polyline(&mut self, vertices: &[Vec2]) -> Result<BodyHandle, PhysicsError> {
        check_polyline(vertices)?;
        let points: Vec<Point<Real>> = vertices.iter().map(|v| Point::new(v.x, v.y)).collect();

        let body = self.bodies.insert(RigidBodyBuilder::fixed().build());
        let collider = ColliderBuilder::polyline(points, None).density(1.0).build();
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        let handle = self.register(body);
        tracing::trace!(?handle, vertices = vertices.len(), "static polyline created");
        Ok(handle)
    }

    fn create_dynamic_ball(&mut self, desc: BallDesc) -> Result<BodyHandle, PhysicsError> {
        check_ball(&desc)?;
        let body = self.bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(Vector::new(desc.position.x, desc.position.y))
                .build(),
        );
        let collider = ColliderBuilder::ball(desc.radius)
            .density(desc.density)
            .friction(desc.friction)
            .restitution(desc.restitution)
            .build();
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        let handle = self.register(body);
        tracing::trace!(?handle, radius = desc.radius, "dynamic ball created");
        Ok(handle)
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(body) = self.handles.remove(&handle) else {
            return false;
        };
        self.bodies
            .remove(
                body,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body(handle).map(|b| {
            let t = b.translation();
            Vec2::new(t.x, t.y)
        })
    }

    fn angle(&self, handle: BodyHandle) -> Option<f32> {
        self.body(handle).map(|b| b.rotation().angle())
    }

    fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body(handle).map(|b| {
            let v = b.linvel();
            Vec2::new(v.x, v.y)
        })
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        let Some(body) = self
            .handles
            .get(&handle)
            .and_then(|h| self.bodies.get_mut(*h))
        else {
            return;
        };
        body.reset_forces(false);
        if force != Vec2::ZERO {
            body.add_force(Vector::new(force.x, force.y), true);
        }
    }

    fn body_count(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn flat_ground(physics: &mut RapierPhysics) -> BodyHandle {
        physics
            .create_static_polyline(&[Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)])
            .unwrap()
    }

    #[test]
    fn ball_falls_without_ground() {
        let mut physics = RapierPhysics::new(-9.8);
        let ball = physics
            .create_dynamic_ball(BallDesc {
                position: Vec2::new(0.0, 5.0),
                ..BallDesc::default()
            })
            .unwrap();
        for _ in 0..60 {
            physics.step(DT);
        }
        let y = physics.position(ball).unwrap().y;
        assert!(y < 1.0, "ball should have fallen, y={y}");
    }

    #[test]
    fn ball_rests_on_polyline_ground() {
        let mut physics = RapierPhysics::new(-9.8);
        flat_ground(&mut physics);
        let ball = physics
            .create_dynamic_ball(BallDesc {
                position: Vec2::new(0.0, 1.0),
                restitution: 0.0,
                ..BallDesc::default()
            })
            .unwrap();
        for _ in 0..240 {
            physics.step(DT);
        }
        let y = physics.position(ball).unwrap().y;
        assert!(y > 0.1 && y < 0.5, "ball should rest on the ground, y={y}");
    }

    #[test]
    fn forward_force_moves_ball_right() {
        let mut physics = RapierPhysics::new(-9.8);
        flat_ground(&mut physics);
        let ball = physics
            .create_dynamic_ball(BallDesc {
                position: Vec2::new(0.0, 0.3),
                ..BallDesc::default()
            })
            .unwrap();
        for _ in 0..60 {
            physics.apply_force(ball, Vec2::new(10.0, 0.0));
            physics.step(DT);
        }
        assert!(physics.position(ball).unwrap().x > 0.1);
        assert!(physics.linear_velocity(ball).unwrap().x > 0.0);
    }

    #[test]
    fn remove_body_releases_it() {
        let mut physics = RapierPhysics::new(-9.8);
        let ground = flat_ground(&mut physics);
        assert_eq!(physics.body_count(), 1);
        assert_eq!(physics.collider_count(), 1);

        assert!(physics.remove_body(ground));
        assert_eq!(physics.body_count(), 0);
        assert_eq!(physics.collider_count(), 0);
        assert!(physics.position(ground).is_none());
        assert!(!physics.remove_body(ground));
    }

    #[test]
    fn rejects_degenerate_polyline() {
        let mut physics = RapierPhysics::new(-9.8);
        assert!(matches!(
            physics.create_static_polyline(&[Vec2::ZERO]),
            Err(PhysicsError::EmptyPolyline(1))
        ));
    }
}
