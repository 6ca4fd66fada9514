//! Cameras that follow a body across the terrain.

mod rig;
mod tracking;

pub use rig::{CameraConfig, CameraId, CameraRig};
pub use tracking::{Boundaries, FollowMode, TrackingCamera, WorldRect};
