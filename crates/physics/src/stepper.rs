use serde::{Deserialize, Serialize};

/// How wall-clock frame time maps onto physics steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Accumulate frame time and run as many fixed steps as fit.
    #[default]
    Accumulate,
    /// Exactly one fixed step per tick, whatever the frame time.
    Fixed,
}

/// Physics parameters shared by the stepper and the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical gravity in m/s², negative pulls down.
    pub gravity: f32,
    /// Length of one physics step in seconds.
    pub fixed_step: f32,
    /// Longest frame delta fed into the accumulator.
    pub max_frame_time: f32,
    pub mode: StepMode,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.8,
            fixed_step: 1.0 / 60.0,
            max_frame_time: 1.0 / 15.0,
            mode: StepMode::Accumulate,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.gravity.is_finite() {
            return Err("gravity must be finite".into());
        }
        if !(self.fixed_step.is_finite() && self.fixed_step > 0.0) {
            return Err(format!("fixed_step must be positive, got {}", self.fixed_step));
        }
        if !(self.max_frame_time.is_finite() && self.max_frame_time >= self.fixed_step) {
            return Err(format!(
                "max_frame_time ({}) must be at least fixed_step ({})",
                self.max_frame_time, self.fixed_step
            ));
        }
        Ok(())
    }
}

/// Fixed-timestep accumulator.
///
/// Long frames are clamped to `max_frame_time` so a stall never triggers a
/// burst of catch-up steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStepper {
    step: f32,
    max_frame_time: f32,
    mode: StepMode,
    accumulator: f32,
    total_steps: u64,
}

impl FixedStepper {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            step: config.fixed_step,
            max_frame_time: config.max_frame_time,
            mode: config.mode,
            accumulator: 0.0,
            total_steps: 0,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    /// Number of steps to run for a frame that took `frame_dt` seconds.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let steps = match self.mode {
            StepMode::Fixed => 1,
            StepMode::Accumulate => {
                let dt = if frame_dt.is_finite() {
                    frame_dt.clamp(0.0, self.max_frame_time)
                } else {
                    0.0
                };
                self.accumulator += dt;
                let mut steps = 0;
                while self.accumulator >= self.step {
                    self.accumulator -= self.step;
                    steps += 1;
                }
                steps
            }
        };
        self.total_steps += u64::from(steps);
        steps
    }

    /// Leftover time as a fraction of one step, for render interpolation.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }
}
