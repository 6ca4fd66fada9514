use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use hillroll_camera::{CameraId, CameraRig};
use hillroll_common::EntityId;
use hillroll_ecs::{ComponentStore, Drawable, PhysicsBody};
use hillroll_physics::{BodyHandle, PhysicsBackend, PhysicsError};
use hillroll_terrain::{HeightField, SegmentBuilder, TerrainError};

use crate::config::StreamConfig;
use crate::stats::StreamStats;

/// Errors from a stream update. The cursor is left on the failing segment.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("terrain: {0}")]
    Terrain(#[from] TerrainError),
    #[error("physics: {0}")]
    Physics(#[from] PhysicsError),
}

/// Inclusive range of height field indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRange {
    pub first: usize,
    pub last: usize,
}

impl SegmentRange {
    /// Number of samples in the range.
    pub fn sample_count(&self) -> usize {
        self.last - self.first + 1
    }
}

impl std::fmt::Display for SegmentRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}

/// A materialized terrain segment: one entity, one static body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveSegment {
    pub entity: EntityId,
    pub body: BodyHandle,
    pub range: SegmentRange,
    pub left_x: f32,
    pub right_x: f32,
}

/// What one update changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamUpdate {
    pub materialized: Vec<LiveSegment>,
    pub retired: Vec<LiveSegment>,
    /// The camera right boundary was set during this update.
    pub boundary_set: bool,
}

/// Sliding window of live terrain segments over a height field.
///
/// The window only ever moves right: the cursor marks the first sample of
/// the next segment to build, and segments are retired oldest first.
pub struct TerrainStream {
    field: HeightField,
    builder: SegmentBuilder,
    config: StreamConfig,
    cursor: usize,
    live: VecDeque<LiveSegment>,
    boundary_set: bool,
    stats: StreamStats,
}

impl TerrainStream {
    pub fn new(field: HeightField, builder: SegmentBuilder, config: StreamConfig) -> Self {
        Self {
            field,
            builder,
            config,
            cursor: 0,
            live: VecDeque::new(),
            boundary_set: false,
            stats: StreamStats::default(),
        }
    }

    /// Bring the window in line with the standard camera.
    ///
    /// Retires segments that ended far enough behind the camera, builds
    /// segments until the terrain reaches past the camera's right edge plus
    /// the lookahead, and clamps every camera to the end of the field once
    /// the field is exhausted.
    pub fn update<P: PhysicsBackend + ?Sized>(
        &mut self,
        cameras: &mut CameraRig,
        physics: &mut P,
        store: &mut ComponentStore,
    ) -> Result<StreamUpdate, StreamError> {
        let _span = tracing::info_span!("stream_update", cursor = self.cursor).entered();
        let started = Instant::now();
        let mut update = StreamUpdate::default();

        let view = cameras.get(CameraId::Standard).world_view();
        let viewport_width = view.width();

        if self.config.retire {
            let retire_before = view.min.x - self.config.retire_margin_fraction * viewport_width;
            while let Some(oldest) = self.live.front().copied() {
                if oldest.right_x >= retire_before {
                    break;
                }
                self.live.pop_front();
                let body = store.despawn(oldest.entity).unwrap_or(oldest.body);
                physics.remove_body(body);
                tracing::debug!(range = %oldest.range, right_x = oldest.right_x, "segment retired");
                update.retired.push(oldest);
            }
        }

        let reach = view.max.x + self.config.lookahead_fraction * viewport_width;
        while !self.is_end_of_field() && self.terrain_right_edge() < reach {
            let segment = self.materialize(physics, store)?;
            update.materialized.push(segment);
        }

        if self.is_end_of_field() && !self.boundary_set {
            let end_x = self.field.end_x();
            cameras.set_boundary_right(end_x);
            self.boundary_set = true;
            update.boundary_set = true;
            tracing::debug!(end_x, "end of field reached, camera right boundary set");
        }

        let over_limit = self.live.len() > self.config.max_live_segments;
        let crossed = over_limit && !self.stats.over_limit;
        if crossed {
            tracing::warn!(
                live = self.live.len(),
                limit = self.config.max_live_segments,
                "live terrain segments above soft limit"
            );
        }

        self.stats = StreamStats {
            materialized_this_tick: update.materialized.len(),
            retired_this_tick: update.retired.len(),
            live_segments: self.live.len(),
            materialized_total: self.stats.materialized_total + update.materialized.len(),
            retired_total: self.stats.retired_total + update.retired.len(),
            cursor: self.cursor,
            end_of_field: self.is_end_of_field(),
            over_limit,
            limit_crossings: self.stats.limit_crossings + usize::from(crossed),
            update_time: started.elapsed(),
        };

        tracing::trace!(
            materialized = update.materialized.len(),
            retired = update.retired.len(),
            live = self.live.len(),
            cursor = self.cursor,
            "stream update complete"
        );

        Ok(update)
    }

    fn materialize<P: PhysicsBackend + ?Sized>(
        &mut self,
        physics: &mut P,
        store: &mut ComponentStore,
    ) -> Result<LiveSegment, StreamError> {
        let range = SegmentRange {
            first: self.cursor,
            last: (self.cursor + self.config.segment_size).min(self.field.last_index()),
        };
        let slice = self.field.slice(range.first, range.last);
        let built = self.builder.build(slice)?;
        let body = physics.create_static_polyline(&built.polyline)?;

        let entity = store.spawn();
        store.set_physics_body(entity, PhysicsBody(body));
        store.set_drawable(entity, Drawable::Mesh(built.mesh));

        let segment = LiveSegment {
            entity,
            body,
            range,
            left_x: slice[0].x,
            right_x: slice[slice.len() - 1].x,
        };
        self.live.push_back(segment);
        self.cursor = range.last;
        tracing::debug!(%entity, range = %range, "segment materialized");
        Ok(segment)
    }

    /// x of the sample under the cursor: where built terrain ends.
    pub fn terrain_right_edge(&self) -> f32 {
        self.field.samples()[self.cursor].x
    }

    pub fn is_end_of_field(&self) -> bool {
        self.cursor == self.field.last_index()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn boundary_set(&self) -> bool {
        self.boundary_set
    }

    /// Live segments, oldest first.
    pub fn live_segments(&self) -> impl ExactSizeIterator<Item = &LiveSegment> {
        self.live.iter()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn height_field(&self) -> &HeightField {
        &self.field
    }

    pub fn builder(&self) -> &SegmentBuilder {
        &self.builder
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}
