//! End-of-run detection for the tracked player body.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    /// The body dropped below the world.
    Fell { y: f32 },
    /// The body is upside down and no longer moving.
    Flipped { tilt_degrees: f32 },
}

impl std::fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOverReason::Fell { y } => write!(f, "fell out of the world (y={y:.2})"),
            GameOverReason::Flipped { tilt_degrees } => {
                write!(f, "flipped over ({tilt_degrees:.0} degrees)")
            }
        }
    }
}

/// Thresholds for ending a run. Reads body state only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOverRule {
    pub min_y: f32,
    pub max_tilt_degrees: f32,
    /// Horizontal speed under which a tilted body counts as stuck.
    pub min_speed: f32,
}

impl Default for GameOverRule {
    fn default() -> Self {
        Self {
            min_y: -10.0,
            max_tilt_degrees: 150.0,
            min_speed: 0.001,
        }
    }
}

impl GameOverRule {
    pub fn evaluate(&self, position: Vec2, angle: f32, velocity: Vec2) -> Option<GameOverReason> {
        if position.y < self.min_y {
            return Some(GameOverReason::Fell { y: position.y });
        }
        let tilt = tilt_degrees(angle);
        if tilt > self.max_tilt_degrees && velocity.x.abs() < self.min_speed {
            return Some(GameOverReason::Flipped { tilt_degrees: tilt });
        }
        None
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.min_y.is_finite() {
            return Err("min_y must be finite".into());
        }
        if !(0.0..=180.0).contains(&self.max_tilt_degrees) {
            return Err(format!(
                "max_tilt_degrees must lie in [0, 180], got {}",
                self.max_tilt_degrees
            ));
        }
        if !(self.min_speed.is_finite() && self.min_speed >= 0.0) {
            return Err(format!("min_speed must be non-negative, got {}", self.min_speed));
        }
        Ok(())
    }
}

/// Absolute deviation from upright in degrees, in `[0, 180]`.
fn tilt_degrees(angle: f32) -> f32 {
    let degrees = angle.to_degrees().rem_euclid(360.0);
    if degrees > 180.0 { 360.0 - degrees } else { degrees }
}
