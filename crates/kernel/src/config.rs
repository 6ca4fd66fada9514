//! World configuration: one struct per system, loadable from YAML.

use serde::{Deserialize, Serialize};

use hillroll_camera::CameraConfig;
use hillroll_physics::PhysicsConfig;
use hillroll_stream::StreamConfig;
use hillroll_terrain::HeightFieldConfig;

use crate::outcome::GameOverRule;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {section} config: {reason}")]
    Invalid {
        section: &'static str,
        reason: String,
    },
    #[error("failed to parse world config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// The player ball.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub radius: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Side of the square sprite drawn over the ball, in meters.
    pub sprite_size: f32,
    /// Horizontal force while accelerating, in newtons.
    pub drive_force: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: 0.25,
            density: 1.0,
            friction: 0.5,
            restitution: 0.6,
            sprite_size: 0.5,
            drive_force: 10.0,
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<(), String> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.radius) || !positive(self.density) || !positive(self.sprite_size) {
            return Err("radius, density and sprite_size must be positive".into());
        }
        if !(self.friction.is_finite() && self.friction >= 0.0) {
            return Err(format!("friction must be non-negative, got {}", self.friction));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(format!("restitution must lie in [0, 1], got {}", self.restitution));
        }
        if !self.drive_force.is_finite() {
            return Err("drive_force must be finite".into());
        }
        Ok(())
    }
}

/// Everything needed to build a world. The seed fully determines the terrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u64,
    pub terrain: HeightFieldConfig,
    pub stream: StreamConfig,
    pub camera: CameraConfig,
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    pub game_over: GameOverRule,
}

impl WorldConfig {
    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain
            .validate()
            .map_err(|e| invalid("terrain", e.to_string()))?;
        self.stream.validate().map_err(|e| invalid("stream", e))?;
        self.camera.validate().map_err(|e| invalid("camera", e))?;
        self.physics.validate().map_err(|e| invalid("physics", e))?;
        self.player.validate().map_err(|e| invalid("player", e))?;
        self.game_over
            .validate()
            .map_err(|e| invalid("game_over", e))?;
        Ok(())
    }
}

fn invalid(section: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { section, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hillroll_camera::FollowMode;
    use hillroll_physics::StepMode;

    #[test]
    fn defaults_are_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "\
seed: 42
stream:
  segment_size: 31
camera:
  follow:
    kind: smooth
    lerp: 2.0
physics:
  mode: fixed
";
        let config = WorldConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.stream.segment_size, 31);
        assert_eq!(config.stream.lookahead_fraction, 0.10);
        assert_eq!(config.camera.follow, FollowMode::Smooth { lerp: 2.0 });
        assert_eq!(config.physics.mode, StepMode::Fixed);
        assert_eq!(config.terrain, HeightFieldConfig::default());
    }

    #[test]
    fn empty_document_is_default() {
        let config = WorldConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, WorldConfig::default());
    }

    #[test]
    fn yaml_round_trip() {
        let config = WorldConfig {
            seed: 9,
            ..WorldConfig::default()
        };
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(WorldConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn invalid_values_name_their_section() {
        let err = WorldConfig::from_yaml_str("terrain:\n  roughness: 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { section: "terrain", .. }));

        let err = WorldConfig::from_yaml_str("stream:\n  segment_size: 0\n").unwrap_err();
        assert!(err.to_string().contains("invalid stream config"));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = WorldConfig::from_yaml_str("seed: [not a number").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
