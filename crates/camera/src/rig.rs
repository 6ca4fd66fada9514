use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tracking::{FollowMode, TrackingCamera};

/// The fixed set of cameras a world exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraId {
    /// Gameplay camera, one unit per meter. Sprites are drawn through it.
    Standard,
    /// Same view at the terrain texture's pixel scale. Meshes are drawn through it.
    Terrain,
}

impl CameraId {
    pub const ALL: [CameraId; 2] = [CameraId::Standard, CameraId::Terrain];

    fn index(self) -> usize {
        match self {
            CameraId::Standard => 0,
            CameraId::Terrain => 1,
        }
    }
}

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraId::Standard => write!(f, "standard"),
            CameraId::Terrain => write!(f, "terrain"),
        }
    }
}

/// Camera rig configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Visible world width in meters; kept across resizes.
    pub viewport_width: f32,
    /// Visible world height in meters until the first resize.
    pub viewport_height: f32,
    /// Pixel scale of the terrain texture, shared by meshes and the terrain camera.
    pub terrain_pixels_per_meter: f32,
    pub follow: FollowMode,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            viewport_width: 10.0,
            viewport_height: 6.0,
            terrain_pixels_per_meter: 128.0,
            follow: FollowMode::Snap,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), String> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.viewport_width) || !positive(self.viewport_height) {
            return Err(format!(
                "viewport must be positive, got {}x{}",
                self.viewport_width, self.viewport_height
            ));
        }
        if !positive(self.terrain_pixels_per_meter) {
            return Err(format!(
                "terrain_pixels_per_meter must be positive, got {}",
                self.terrain_pixels_per_meter
            ));
        }
        if let FollowMode::Smooth { lerp } = self.follow {
            if !(lerp.is_finite() && lerp >= 0.0) {
                return Err(format!("follow lerp must be non-negative, got {lerp}"));
            }
        }
        Ok(())
    }
}

/// The standard and terrain cameras, moved and resized together.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    cameras: [TrackingCamera; 2],
    viewport_width: f32,
}

impl CameraRig {
    pub fn new(config: &CameraConfig) -> Self {
        let make = |units_per_meter: f32| {
            let mut camera = TrackingCamera::new(
                config.viewport_width,
                config.viewport_height,
                units_per_meter,
                config.follow,
                true,
                false,
            );
            camera.set_boundary_left(0.0);
            camera
        };
        Self {
            cameras: [make(1.0), make(config.terrain_pixels_per_meter)],
            viewport_width: config.viewport_width,
        }
    }

    pub fn get(&self, id: CameraId) -> &TrackingCamera {
        &self.cameras[id.index()]
    }

    pub fn get_mut(&mut self, id: CameraId) -> &mut TrackingCamera {
        &mut self.cameras[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CameraId, &TrackingCamera)> {
        CameraId::ALL.into_iter().zip(self.cameras.iter())
    }

    /// The configured world viewport width in meters.
    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    /// Clamp every camera's right edge to `world_x`.
    pub fn set_boundary_right(&mut self, world_x: f32) {
        for camera in &mut self.cameras {
            camera.set_boundary_right(world_x);
        }
    }

    /// Move every camera toward `target` in world units.
    pub fn follow(&mut self, target: Vec2, dt: f32) {
        for camera in &mut self.cameras {
            camera.follow(target, dt);
        }
    }

    /// Adapt to a new surface size in pixels. The world width is kept and the
    /// height follows the aspect ratio.
    pub fn resize(&mut self, pixel_width: u32, pixel_height: u32) {
        if pixel_width == 0 {
            tracing::warn!(pixel_width, pixel_height, "ignoring resize to zero width");
            return;
        }
        let world_height = self.viewport_width * pixel_height as f32 / pixel_width as f32;
        for camera in &mut self.cameras {
            camera.resize(self.viewport_width, world_height);
        }
        tracing::debug!(
            world_width = self.viewport_width,
            world_height,
            "camera rig resized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cameras_share_world_view_at_different_scales() {
        let rig = CameraRig::new(&CameraConfig::default());
        let standard = rig.get(CameraId::Standard);
        let terrain = rig.get(CameraId::Terrain);
        assert_eq!(standard.units_per_meter(), 1.0);
        assert_eq!(terrain.units_per_meter(), 128.0);
        assert_eq!(standard.world_view(), terrain.world_view());
        assert_eq!(standard.boundaries().left, Some(0.0));
        assert!(standard.tracks_x() && !standard.tracks_y());
    }

    #[test]
    fn follow_moves_both_cameras() {
        let mut rig = CameraRig::new(&CameraConfig::default());
        rig.follow(Vec2::new(20.0, 3.0), 1.0 / 60.0);
        for (_, camera) in rig.iter() {
            assert_eq!(camera.world_position().x, 20.0);
        }
    }

    #[test]
    fn right_boundary_applies_to_every_camera() {
        let mut rig = CameraRig::new(&CameraConfig::default());
        rig.set_boundary_right(40.0);
        assert_eq!(rig.get(CameraId::Standard).boundaries().right, Some(40.0));
        assert_eq!(rig.get(CameraId::Terrain).boundaries().right, Some(40.0 * 128.0));
        rig.follow(Vec2::new(100.0, 0.0), 0.1);
        assert_eq!(rig.get(CameraId::Standard).right_edge(), 10.0);
    }

    #[test]
    fn resize_keeps_world_width() {
        let mut rig = CameraRig::new(&CameraConfig::default());
        rig.resize(800, 400);
        let standard = rig.get(CameraId::Standard);
        assert_eq!(standard.world_viewport(), Vec2::new(10.0, 5.0));
        assert_eq!(rig.get(CameraId::Terrain).viewport(), Vec2::new(1280.0, 640.0));
    }

    #[test]
    fn zero_width_resize_is_ignored() {
        let mut rig = CameraRig::new(&CameraConfig::default());
        let before = rig.clone();
        rig.resize(0, 600);
        assert_eq!(rig, before);
    }

    #[test]
    fn config_validation() {
        assert!(CameraConfig::default().validate().is_ok());
        let bad = CameraConfig {
            follow: FollowMode::Smooth { lerp: -1.0 },
            ..CameraConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
