use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

/// How the camera closes the gap to its target on a tracked axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FollowMode {
    /// Jump straight onto the target every tick.
    #[default]
    Snap,
    /// Move `clamp(lerp * dt, 0, 1)` of the way toward the target.
    Smooth { lerp: f32 },
}

impl FollowMode {
    fn factor(self, dt: f32) -> f32 {
        match self {
            FollowMode::Snap => 1.0,
            FollowMode::Smooth { lerp } => (lerp * dt).clamp(0.0, 1.0),
        }
    }
}

/// Optional clamps on camera position, in camera units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Boundaries {
    pub left: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub top: Option<f32>,
}

/// Axis-aligned rectangle in world units (y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldRect {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// 2D camera that follows a target independently per axis.
///
/// Position and viewport are in camera units: world meters times
/// `units_per_meter`. The position is the viewport's center. A boundary is a
/// hard clamp: if a tick's movement would push the viewport's edge past it,
/// that axis does not move at all for the tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingCamera {
    position: Vec2,
    viewport: Vec2,
    units_per_meter: f32,
    boundaries: Boundaries,
    track_x: bool,
    track_y: bool,
    follow: FollowMode,
}

impl TrackingCamera {
    /// Camera over a `world_width` x `world_height` meter view with its
    /// bottom-left corner at the world origin.
    pub fn new(
        world_width: f32,
        world_height: f32,
        units_per_meter: f32,
        follow: FollowMode,
        track_x: bool,
        track_y: bool,
    ) -> Self {
        let viewport = Vec2::new(world_width, world_height) * units_per_meter;
        Self {
            position: viewport / 2.0,
            viewport,
            units_per_meter,
            boundaries: Boundaries::default(),
            track_x,
            track_y,
            follow,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Viewport center in world units.
    pub fn world_position(&self) -> Vec2 {
        self.position / self.units_per_meter
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Viewport size in world units.
    pub fn world_viewport(&self) -> Vec2 {
        self.viewport / self.units_per_meter
    }

    pub fn units_per_meter(&self) -> f32 {
        self.units_per_meter
    }

    pub fn boundaries(&self) -> Boundaries {
        self.boundaries
    }

    pub fn follow_mode(&self) -> FollowMode {
        self.follow
    }

    pub fn set_follow_mode(&mut self, follow: FollowMode) {
        self.follow = follow;
    }

    pub fn tracks_x(&self) -> bool {
        self.track_x
    }

    pub fn tracks_y(&self) -> bool {
        self.track_y
    }

    /// Place the camera directly, bypassing boundaries.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn set_boundary_left(&mut self, world_x: f32) {
        self.boundaries.left = Some(world_x * self.units_per_meter);
    }

    pub fn set_boundary_right(&mut self, world_x: f32) {
        self.boundaries.right = Some(world_x * self.units_per_meter);
    }

    pub fn set_boundary_bottom(&mut self, world_y: f32) {
        self.boundaries.bottom = Some(world_y * self.units_per_meter);
    }

    pub fn set_boundary_top(&mut self, world_y: f32) {
        self.boundaries.top = Some(world_y * self.units_per_meter);
    }

    /// Move toward `target` (world units) on each tracked axis.
    pub fn follow(&mut self, target: Vec2, dt: f32) {
        let factor = self.follow.factor(dt);
        let goal = target * self.units_per_meter;

        if self.track_x {
            let candidate = self.position.x + (goal.x - self.position.x) * factor;
            if within(
                candidate,
                self.boundaries.left,
                self.boundaries.right,
                self.viewport.x,
            ) {
                self.position.x = candidate;
            }
        }
        if self.track_y {
            let candidate = self.position.y + (goal.y - self.position.y) * factor;
            if within(
                candidate,
                self.boundaries.bottom,
                self.boundaries.top,
                self.viewport.y,
            ) {
                self.position.y = candidate;
            }
        }
    }

    /// Set the viewport to `world_width` x `world_height` meters.
    pub fn resize(&mut self, world_width: f32, world_height: f32) {
        self.viewport = Vec2::new(world_width, world_height) * self.units_per_meter;
    }

    pub fn left_edge(&self) -> f32 {
        self.position.x - self.viewport.x / 2.0
    }

    pub fn right_edge(&self) -> f32 {
        self.position.x + self.viewport.x / 2.0
    }

    pub fn bottom_edge(&self) -> f32 {
        self.position.y - self.viewport.y / 2.0
    }

    pub fn top_edge(&self) -> f32 {
        self.position.y + self.viewport.y / 2.0
    }

    /// Visible region in world units.
    pub fn world_view(&self) -> WorldRect {
        let half = self.viewport / 2.0;
        WorldRect {
            min: (self.position - half) / self.units_per_meter,
            max: (self.position + half) / self.units_per_meter,
        }
    }

    /// Horizontal offset for screen-fixed overlays: the viewport's left edge.
    pub fn hud_offset(&self) -> f32 {
        self.left_edge()
    }

    /// Orthographic projection of the viewport, in camera units.
    pub fn view_projection(&self) -> Mat4 {
        Mat4::orthographic_rh(
            self.left_edge(),
            self.right_edge(),
            self.bottom_edge(),
            self.top_edge(),
            -1.0,
            1.0,
        )
    }
}

/// Whether a viewport of `extent` centered at `candidate` stays inside the bounds.
fn within(candidate: f32, min: Option<f32>, max: Option<f32>, extent: f32) -> bool {
    let half = extent / 2.0;
    if min.is_some_and(|min| candidate < min + half) {
        return false;
    }
    if max.is_some_and(|max| candidate > max - half) {
        return false;
    }
    true
}
