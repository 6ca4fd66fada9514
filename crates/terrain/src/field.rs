use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::midpoint::{midpoint_displacement, sample_count};

/// Largest accepted iteration count; 2^20 samples per block is already far
/// beyond anything a level needs.
pub const MAX_ITERATIONS: u32 = 20;

/// Parameters for generating a world's height field.
///
/// `range`, `first_y` and the displacement happen in raw generator units;
/// `scale_x` and `scale_y` convert samples to world units (meters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightFieldConfig {
    /// Halvings per block; a block has `2^iterations + 1` samples.
    pub iterations: u32,
    /// Vertical range of a block in raw units.
    pub range: f32,
    /// Amplitude decay per halving, in (0, 1). Closer to 1 is rougher.
    pub roughness: f32,
    /// Horizontal distance between samples, in meters.
    pub scale_x: f32,
    /// Raw-to-meters vertical factor.
    pub scale_y: f32,
    /// World x of the first sample.
    pub x_offset: f32,
    /// Raw height of the very first sample.
    pub first_y: f32,
    /// Number of blocks chained end to end.
    pub blocks: u32,
    /// Lowest allowed world height, keeping the ground above the mesh base.
    pub floor: Option<f32>,
}

impl Default for HeightFieldConfig {
    fn default() -> Self {
        Self {
            iterations: 11,
            range: 18.0,
            roughness: 0.5,
            scale_x: 0.04,
            scale_y: 0.25,
            x_offset: 0.0,
            first_y: 9.0,
            blocks: 1,
            floor: Some(0.25),
        }
    }
}

impl HeightFieldConfig {
    pub fn validate(&self) -> Result<(), TerrainError> {
        let invalid = |msg: &str| Err(TerrainError::InvalidHeightField(msg.to_string()));
        if self.iterations > MAX_ITERATIONS {
            return invalid("iterations exceeds the supported maximum");
        }
        if !(self.range.is_finite() && self.range >= 0.0) {
            return invalid("range must be finite and non-negative");
        }
        if !(self.roughness > 0.0 && self.roughness < 1.0) {
            return invalid("roughness must lie strictly between 0 and 1");
        }
        if !(self.scale_x.is_finite() && self.scale_x > 0.0) {
            return invalid("scale_x must be positive");
        }
        if !(self.scale_y.is_finite() && self.scale_y > 0.0) {
            return invalid("scale_y must be positive");
        }
        if !self.x_offset.is_finite() || !self.first_y.is_finite() {
            return invalid("x_offset and first_y must be finite");
        }
        if self.blocks == 0 {
            return invalid("at least one block is required");
        }
        Ok(())
    }

    /// Total number of samples the config produces.
    pub fn total_samples(&self) -> usize {
        (sample_count(self.iterations) - 1) * self.blocks as usize + 1
    }
}

/// The full, immutable sequence of terrain samples for one world.
///
/// Samples are in world units with strictly increasing x. The field never
/// changes after construction; streaming only reads slices of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeightField {
    samples: Vec<Vec2>,
}

impl HeightField {
    /// Generate a field from `config`, drawing all randomness from `seed`.
    ///
    /// Each block ends at a raw height drawn uniformly from `[0, range)`; the
    /// next block starts from that sample, which is stored only once.
    pub fn generate(config: &HeightFieldConfig, seed: u64) -> Result<Self, TerrainError> {
        config.validate()?;
        let _span = tracing::debug_span!("height_field_generate", seed).entered();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut raw: Vec<f32> = Vec::with_capacity(config.total_samples());
        let mut first_y = config.first_y;

        for block in 0..config.blocks {
            let last_y = rng.r#gen::<f32>() * config.range;
            let values = midpoint_displacement(
                config.iterations,
                config.range,
                first_y,
                last_y,
                config.roughness,
                &mut rng,
            );
            let skip = usize::from(block > 0);
            raw.extend_from_slice(&values[skip..]);
            first_y = last_y;
        }

        let floor = config.floor.unwrap_or(f32::NEG_INFINITY);
        let samples = raw
            .iter()
            .enumerate()
            .map(|(i, y)| {
                Vec2::new(
                    config.x_offset + i as f32 * config.scale_x,
                    (y * config.scale_y).max(floor),
                )
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            samples = samples.len(),
            end_x = samples[samples.len() - 1].x,
            "height field generated"
        );
        Self::from_samples(samples)
    }

    /// Wrap externally produced samples, checking the field invariants.
    pub fn from_samples(samples: Vec<Vec2>) -> Result<Self, TerrainError> {
        if samples.len() < 2 {
            return Err(TerrainError::InvalidHeightField(format!(
                "need at least 2 samples, got {}",
                samples.len()
            )));
        }
        if let Some(i) = samples.iter().position(|s| !s.is_finite()) {
            return Err(TerrainError::InvalidHeightField(format!(
                "sample {i} is not finite"
            )));
        }
        if let Some(i) = samples.windows(2).position(|w| w[1].x <= w[0].x) {
            return Err(TerrainError::InvalidHeightField(format!(
                "x is not strictly increasing at sample {}",
                i + 1
            )));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Vec2] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; a field holds at least two samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.samples.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<Vec2> {
        self.samples.get(index).copied()
    }

    /// Inclusive slice `[first, last]`, clamped to the field.
    pub fn slice(&self, first: usize, last: usize) -> &[Vec2] {
        let last = last.min(self.last_index());
        let first = first.min(last);
        &self.samples[first..=last]
    }

    pub fn start_x(&self) -> f32 {
        self.samples[0].x
    }

    pub fn end_x(&self) -> f32 {
        self.samples[self.last_index()].x
    }

    /// Lowest and highest sample height.
    pub fn height_bounds(&self) -> (f32, f32) {
        self.samples
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.y), hi.max(s.y))
            })
    }
}
