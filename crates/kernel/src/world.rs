use std::collections::VecDeque;
use std::time::Instant;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use hillroll_camera::{CameraId, CameraRig, TrackingCamera};
use hillroll_common::{EntityId, Transform2D};
use hillroll_ecs::{ComponentMask, ComponentStore, Drawable, Motion, PhysicsBody, PlayerControl};
use hillroll_physics::{
    BallDesc, FixedStepper, PhysicsBackend, PhysicsError, RapierPhysics,
};
use hillroll_stream::{FrameTimer, SegmentRange, StreamError, StreamStats, TerrainStream};
use hillroll_terrain::{HeightField, SegmentBuilder, TerrainError};

use crate::config::{ConfigError, WorldConfig};
use crate::frame::Frame;
use crate::outcome::GameOverReason;

/// Number of tick durations kept for instrumentation.
const FRAME_HISTORY: usize = 120;

/// Events kept between drains; the oldest are dropped past this.
pub const EVENT_LOG_CAPACITY: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("terrain generation failed: {0}")]
    Terrain(#[from] TerrainError),
    #[error("terrain streaming failed: {0}")]
    Stream(#[from] StreamError),
    #[error("physics: {0}")]
    Physics(#[from] PhysicsError),
}

/// An event record for every externally visible change to the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    PlayerSpawned { entity: EntityId, position: Vec2 },
    /// A tick ran `steps` fixed physics steps.
    Stepped { tick: u64, steps: u32 },
    SegmentMaterialized { entity: EntityId, range: SegmentRange },
    SegmentRetired { entity: EntityId, range: SegmentRange },
    /// The end of the field was reached and cameras were clamped to `x`.
    BoundarySet { x: f32 },
    Resized { width: u32, height: u32 },
    GameOver { tick: u64, reason: GameOverReason },
}

/// Summary of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub steps: u32,
    pub materialized: usize,
    pub retired: usize,
    pub boundary_set: bool,
    pub player_position: Option<Vec2>,
    pub game_over: Option<GameOverReason>,
}

/// The whole runtime: physics, components, terrain stream and cameras.
///
/// A world is built once from a [`WorldConfig`]; its height field is
/// generated from the config's seed and never changes afterwards.
pub struct World<P: PhysicsBackend> {
    config: WorldConfig,
    physics: P,
    store: ComponentStore,
    stream: TerrainStream,
    cameras: CameraRig,
    stepper: FixedStepper,
    tick: u64,
    game_over: Option<GameOverReason>,
    event_log: VecDeque<WorldEvent>,
    frame_timer: FrameTimer,
}

impl World<RapierPhysics> {
    /// World backed by rapier with the configured gravity.
    pub fn with_rapier(config: WorldConfig) -> Result<Self, WorldError> {
        let physics = RapierPhysics::new(config.physics.gravity);
        Self::new(config, physics)
    }
}

impl<P: PhysicsBackend> World<P> {
    pub fn new(config: WorldConfig, physics: P) -> Result<Self, WorldError> {
        config.validate()?;
        let field = HeightField::generate(&config.terrain, config.seed)?;
        tracing::info!(
            seed = config.seed,
            samples = field.len(),
            end_x = field.end_x(),
            "world created"
        );

        let builder = SegmentBuilder::uniform(config.camera.terrain_pixels_per_meter)?;
        let stream = TerrainStream::new(field, builder, config.stream.clone());
        let cameras = CameraRig::new(&config.camera);
        let stepper = FixedStepper::new(&config.physics);

        Ok(Self {
            config,
            physics,
            store: ComponentStore::new(),
            stream,
            cameras,
            stepper,
            tick: 0,
            game_over: None,
            event_log: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
            frame_timer: FrameTimer::new(FRAME_HISTORY),
        })
    }

    /// Spawn the player ball at the horizontal center of the view, one
    /// viewport height up, and make it the entity the cameras follow.
    pub fn spawn_player(&mut self) -> Result<EntityId, WorldError> {
        let viewport = self.cameras.get(CameraId::Standard).world_viewport();
        let position = Vec2::new(viewport.x / 2.0, viewport.y);
        let player = self.config.player;

        let body = self.physics.create_dynamic_ball(BallDesc {
            position,
            radius: player.radius,
            density: player.density,
            friction: player.friction,
            restitution: player.restitution,
        })?;

        if let Some(previous) = self.store.main_player() {
            self.store.set_main_player(previous, false);
        }
        let entity = self.store.spawn();
        self.store.set_physics_body(entity, PhysicsBody(body));
        self.store.set_drawable(
            entity,
            Drawable::Sprite {
                size: Vec2::splat(player.sprite_size),
            },
        );
        self.store
            .set_transform(entity, Transform2D::from_position(position));
        self.store.set_motion(entity, Motion::default());
        self.store
            .set_player_control(entity, PlayerControl::default());
        self.store.set_main_player(entity, true);

        tracing::info!(%entity, x = position.x, y = position.y, "player spawned");
        self.record(WorldEvent::PlayerSpawned { entity, position });
        Ok(entity)
    }

    /// Player input: positive drives forward, negative backward, zero coasts.
    pub fn set_accelerate(&mut self, value: f32) {
        let controlled: Vec<EntityId> = self
            .store
            .matching(ComponentMask::PLAYER_CONTROL)
            .collect();
        for entity in controlled {
            if let Some(control) = self.store.player_control_mut(entity) {
                control.accelerate = value;
            }
        }
    }

    /// Advance the world by one frame of `frame_dt` wall-clock seconds.
    pub fn tick(&mut self, frame_dt: f32) -> Result<TickReport, WorldError> {
        let started = Instant::now();
        self.tick += 1;
        let _span = tracing::info_span!("tick", tick = self.tick).entered();

        // Physics.
        self.update_motion();
        let steps = self.stepper.advance(frame_dt);
        let step = self.stepper.step();
        for _ in 0..steps {
            self.apply_motion();
            self.physics.step(step);
        }
        self.sync_transforms();
        self.record(WorldEvent::Stepped {
            tick: self.tick,
            steps,
        });

        // Terrain.
        let update = self
            .stream
            .update(&mut self.cameras, &mut self.physics, &mut self.store)?;
        for segment in &update.retired {
            self.record(WorldEvent::SegmentRetired {
                entity: segment.entity,
                range: segment.range,
            });
        }
        for segment in &update.materialized {
            self.record(WorldEvent::SegmentMaterialized {
                entity: segment.entity,
                range: segment.range,
            });
        }
        if update.boundary_set {
            self.record(WorldEvent::BoundarySet {
                x: self.stream.height_field().end_x(),
            });
        }

        // Cameras.
        let player_position = self.player_position();
        if let Some(target) = player_position {
            self.cameras.follow(target, steps as f32 * step);
        }

        // Game over.
        if self.game_over.is_none() {
            if let Some(reason) = self.evaluate_game_over() {
                tracing::info!(tick = self.tick, %reason, "game over");
                self.game_over = Some(reason);
                self.record(WorldEvent::GameOver {
                    tick: self.tick,
                    reason,
                });
            }
        }

        self.frame_timer.record(started.elapsed());
        tracing::trace!(
            steps,
            materialized = update.materialized.len(),
            retired = update.retired.len(),
            "tick complete"
        );

        Ok(TickReport {
            tick: self.tick,
            steps,
            materialized: update.materialized.len(),
            retired: update.retired.len(),
            boundary_set: update.boundary_set,
            player_position,
            game_over: self.game_over,
        })
    }

    /// Propagate a surface resize, in pixels, to every camera.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.cameras.resize(width, height);
        self.record(WorldEvent::Resized { width, height });
    }

    /// Turn each controlled entity's intent into its motion force.
    fn update_motion(&mut self) {
        let drive = self.config.player.drive_force;
        let mask = ComponentMask::PLAYER_CONTROL | ComponentMask::MOTION;
        let controlled: Vec<EntityId> = self.store.matching(mask).collect();
        for entity in controlled {
            let accelerate = self
                .store
                .player_control(entity)
                .map_or(0.0, |c| c.accelerate);
            let force = if accelerate > 0.0 {
                Vec2::new(drive, 0.0)
            } else if accelerate < 0.0 {
                Vec2::new(-drive, 0.0)
            } else {
                Vec2::ZERO
            };
            if let Some(motion) = self.store.motion_mut(entity) {
                motion.force = force;
            }
        }
    }

    fn apply_motion(&mut self) {
        let mask = ComponentMask::MOTION | ComponentMask::PHYSICS_BODY;
        for entity in self.store.matching(mask) {
            if let (Some(motion), Some(body)) =
                (self.store.motion(entity), self.store.physics_body(entity))
            {
                self.physics.apply_force(body.0, motion.force);
            }
        }
    }

    /// Copy body placement from physics into each entity's transform.
    fn sync_transforms(&mut self) {
        let mask = ComponentMask::PHYSICS_BODY | ComponentMask::TRANSFORM;
        let synced: Vec<EntityId> = self.store.matching(mask).collect();
        for entity in synced {
            let Some(body) = self.store.physics_body(entity).map(|b| b.0) else {
                continue;
            };
            let (Some(position), Some(angle)) =
                (self.physics.position(body), self.physics.angle(body))
            else {
                continue;
            };
            if let Some(transform) = self.store.transform_mut(entity) {
                *transform = Transform2D { position, angle };
            }
        }
    }

    fn evaluate_game_over(&self) -> Option<GameOverReason> {
        let body = self.player_body()?;
        let position = self.physics.position(body)?;
        let angle = self.physics.angle(body)?;
        let velocity = self.physics.linear_velocity(body)?;
        self.config.game_over.evaluate(position, angle, velocity)
    }

    fn player_body(&self) -> Option<hillroll_physics::BodyHandle> {
        let player = self.store.main_player()?;
        self.store.physics_body(player).map(|b| b.0)
    }

    /// World position of the main player's body.
    pub fn player_position(&self) -> Option<Vec2> {
        self.physics.position(self.player_body()?)
    }

    pub fn player(&self) -> Option<EntityId> {
        self.store.main_player()
    }

    pub fn camera(&self, id: CameraId) -> &TrackingCamera {
        self.cameras.get(id)
    }

    pub fn cameras(&self) -> &CameraRig {
        &self.cameras
    }

    /// Number of ticks run so far.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn game_over(&self) -> Option<GameOverReason> {
        self.game_over
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn height_field(&self) -> &HeightField {
        self.stream.height_field()
    }

    pub fn stream(&self) -> &TerrainStream {
        &self.stream
    }

    pub fn stream_stats(&self) -> &StreamStats {
        self.stream.stats()
    }

    pub fn frame_timer(&self) -> &FrameTimer {
        &self.frame_timer
    }

    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    /// Read-only access to the event log, oldest first.
    pub fn events(&self) -> &VecDeque<WorldEvent> {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        self.event_log.drain(..).collect()
    }

    fn record(&mut self, event: WorldEvent) {
        if self.event_log.len() >= EVENT_LOG_CAPACITY {
            if let Some(dropped) = self.event_log.pop_front() {
                tracing::trace!(?dropped, "event log full, dropping oldest");
            }
        }
        self.event_log.push_back(event);
    }

    /// Everything a renderer needs for the current state.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            tick: self.tick,
            cameras: &self.cameras,
            store: &self.store,
            stream: self.stream.stats(),
            player: self.store.main_player(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hillroll_physics::{ScriptedPhysics, StepMode};

    const DT: f32 = 1.0 / 60.0;

    fn config() -> WorldConfig {
        let mut config = WorldConfig {
            seed: 7,
            ..WorldConfig::default()
        };
        config.physics.mode = StepMode::Fixed;
        config
    }

    fn world() -> World<ScriptedPhysics> {
        World::new(config(), ScriptedPhysics::new()).unwrap()
    }

    fn player_body(world: &World<ScriptedPhysics>) -> hillroll_physics::BodyHandle {
        world.player_body().unwrap()
    }

    #[test]
    fn new_world_generates_field_from_seed() {
        let a = world();
        let b = world();
        assert_eq!(a.height_field().len(), 2049);
        assert_eq!(a.height_field(), b.height_field());

        let other = World::new(
            WorldConfig {
                seed: 8,
                ..config()
            },
            ScriptedPhysics::new(),
        )
        .unwrap();
        assert_ne!(a.height_field(), other.height_field());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut bad = config();
        bad.terrain.roughness = 1.0;
        let result = World::new(bad, ScriptedPhysics::new());
        assert!(matches!(result, Err(WorldError::Config(_))));
    }

    #[test]
    fn first_tick_streams_terrain_past_the_view() {
        let mut w = world();
        let report = w.tick(DT).unwrap();
        assert_eq!(report.tick, 1);
        assert_eq!(report.steps, 1);
        // 62 samples of 0.04 m per segment; terrain must reach 11 m.
        assert_eq!(report.materialized, 5);
        assert_eq!(w.stream_stats().cursor, 310);
        assert_eq!(w.physics().static_count(), 5);
        assert_eq!(w.store().len(), 5);
        assert_eq!(
            w.events()
                .iter()
                .filter(|e| matches!(e, WorldEvent::SegmentMaterialized { .. }))
                .count(),
            5
        );
    }

    #[test]
    fn player_spawns_at_view_center_one_viewport_up() {
        let mut w = world();
        let player = w.spawn_player().unwrap();
        assert_eq!(w.player(), Some(player));
        assert_eq!(w.player_position(), Some(Vec2::new(5.0, 6.0)));
        let mask = w.store().mask(player);
        assert!(mask.contains(
            ComponentMask::PHYSICS_BODY
                | ComponentMask::DRAWABLE
                | ComponentMask::TRANSFORM
                | ComponentMask::MAIN_PLAYER
        ));
        assert!(matches!(
            w.events().back(),
            Some(WorldEvent::PlayerSpawned { .. })
        ));
    }

    #[test]
    fn cameras_follow_the_player() {
        let mut w = world();
        w.spawn_player().unwrap();
        let body = player_body(&w);
        w.physics_mut().set_velocity(body, Vec2::new(6.0, 0.0));

        for _ in 0..120 {
            w.tick(DT).unwrap();
        }
        let x = w.player_position().unwrap().x;
        assert!(x > 15.0);
        assert!((w.camera(CameraId::Standard).world_position().x - x).abs() < 1e-3);
        assert!((w.camera(CameraId::Terrain).world_position().x - x).abs() < 1e-2);
        // The transform mirrors the body.
        let player = w.player().unwrap();
        assert_eq!(w.store().transform(player).unwrap().position.x, x);
    }

    #[test]
    fn camera_holds_at_left_boundary() {
        let mut w = world();
        w.spawn_player().unwrap();
        let body = player_body(&w);
        w.physics_mut().set_velocity(body, Vec2::new(-3.0, 0.0));
        for _ in 0..30 {
            w.tick(DT).unwrap();
        }
        assert!(w.player_position().unwrap().x < 5.0);
        assert_eq!(w.camera(CameraId::Standard).left_edge(), 0.0);
    }

    #[test]
    fn accelerate_drives_the_player() {
        let mut w = world();
        w.spawn_player().unwrap();
        w.set_accelerate(1.0);
        for _ in 0..10 {
            w.tick(DT).unwrap();
        }
        let body = player_body(&w);
        assert!(w.physics().linear_velocity(body).unwrap().x > 0.0);

        w.set_accelerate(-1.0);
        for _ in 0..30 {
            w.tick(DT).unwrap();
        }
        assert!(w.physics().linear_velocity(body).unwrap().x < 0.0);
    }

    #[test]
    fn segments_behind_the_camera_are_retired() {
        let mut w = world();
        w.spawn_player().unwrap();
        let body = player_body(&w);
        w.physics_mut().set_velocity(body, Vec2::new(30.0, 0.0));
        for _ in 0..120 {
            w.tick(DT).unwrap();
        }
        let stats = w.stream_stats().clone();
        assert!(stats.retired_total > 0);
        assert_eq!(stats.live_segments, w.stream().live_count());
        // Live segments plus the player.
        assert_eq!(w.physics().body_count(), stats.live_segments + 1);
        assert_eq!(w.store().len(), stats.live_segments + 1);
        assert!(
            w.events()
                .iter()
                .any(|e| matches!(e, WorldEvent::SegmentRetired { .. }))
        );
    }

    #[test]
    fn end_of_field_sets_boundary_once() {
        let mut config = config();
        config.terrain.iterations = 6;
        config.stream.segment_size = 16;
        let mut w = World::new(config, ScriptedPhysics::new()).unwrap();
        // 65 samples reach 2.56 m: the first tick exhausts the field.
        for _ in 0..20 {
            w.tick(DT).unwrap();
        }
        let boundary_events: Vec<&WorldEvent> = w
            .events()
            .iter()
            .filter(|e| matches!(e, WorldEvent::BoundarySet { .. }))
            .collect();
        assert_eq!(boundary_events.len(), 1);
        assert!(w.stream_stats().end_of_field);
        let end_x = w.height_field().end_x();
        assert_eq!(
            w.camera(CameraId::Standard).boundaries().right,
            Some(end_x)
        );
    }

    #[test]
    fn falling_player_ends_the_run_once() {
        let mut w = world();
        w.spawn_player().unwrap();
        let body = player_body(&w);
        w.physics_mut().set_position(body, Vec2::new(5.0, -11.0));

        let report = w.tick(DT).unwrap();
        assert!(matches!(report.game_over, Some(GameOverReason::Fell { .. })));
        w.tick(DT).unwrap();
        assert_eq!(
            w.events()
                .iter()
                .filter(|e| matches!(e, WorldEvent::GameOver { .. }))
                .count(),
            1
        );
        assert!(w.game_over().is_some());
    }

    #[test]
    fn flipped_still_player_ends_the_run() {
        let mut w = world();
        w.spawn_player().unwrap();
        let body = player_body(&w);
        w.physics_mut().set_angle(body, 175.0_f32.to_radians());
        let report = w.tick(DT).unwrap();
        assert!(matches!(
            report.game_over,
            Some(GameOverReason::Flipped { .. })
        ));
    }

    #[test]
    fn resize_reaches_every_camera() {
        let mut w = world();
        w.resize(1000, 500);
        for (_, camera) in w.cameras().iter() {
            assert_eq!(camera.world_viewport(), Vec2::new(10.0, 5.0));
        }
        assert_eq!(
            w.events().back(),
            Some(&WorldEvent::Resized {
                width: 1000,
                height: 500
            })
        );
    }

    #[test]
    fn drain_events_clears_log() {
        let mut w = world();
        w.tick(DT).unwrap();
        let events = w.drain_events();
        assert!(matches!(events[0], WorldEvent::Stepped { tick: 1, steps: 1 }));
        assert!(w.events().is_empty());
    }

    #[test]
    fn event_log_is_bounded_without_drains() {
        let mut w = world();
        w.spawn_player().unwrap();
        for _ in 0..(EVENT_LOG_CAPACITY as u64 * 3) {
            w.tick(DT).unwrap();
        }
        assert_eq!(w.events().len(), EVENT_LOG_CAPACITY);
        let last_tick = w.current_tick();
        assert!(matches!(
            w.events().iter().rev().find(|e| matches!(e, WorldEvent::Stepped { .. })),
            Some(WorldEvent::Stepped { tick, .. }) if *tick == last_tick
        ));
        assert!(
            !w.events()
                .iter()
                .any(|e| matches!(e, WorldEvent::PlayerSpawned { .. }))
        );
    }

    #[test]
    fn accumulate_mode_follows_wall_clock() {
        let mut config = config();
        config.physics.mode = StepMode::Accumulate;
        let mut w = World::new(config, ScriptedPhysics::new()).unwrap();
        let report = w.tick(0.001).unwrap();
        assert_eq!(report.steps, 0);
        // A long stall is clamped to 1/15 s.
        let report = w.tick(1.0).unwrap();
        assert!(report.steps <= 4);
        assert_eq!(w.frame_timer().count(), 2);
    }

    #[test]
    fn frame_exposes_render_state() {
        let mut w = world();
        let player = w.spawn_player().unwrap();
        w.tick(DT).unwrap();
        let frame = w.frame();
        assert_eq!(frame.tick, 1);
        assert_eq!(frame.player, Some(player));
        assert_eq!(frame.stream.live_segments, 5);
        assert_eq!(frame.store.len(), 6);
    }
}
