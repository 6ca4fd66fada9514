use serde::{Deserialize, Serialize};

/// Streaming window configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Cursor step per segment. A full segment holds `segment_size + 1`
    /// samples; the last one may be shorter.
    pub segment_size: usize,
    /// How far past the camera's right edge terrain must exist, as a
    /// fraction of the viewport width.
    pub lookahead_fraction: f32,
    /// Whether segments behind the camera are released.
    pub retire: bool,
    /// How far behind the camera's left edge a segment must end before it is
    /// retired, as a fraction of the viewport width.
    ///
    /// The cursor only moves forward, so retired terrain is never rebuilt. A
    /// player that reverses further than this margin past the view's left
    /// edge rolls off the end of the live terrain and falls.
    pub retire_margin_fraction: f32,
    /// Live segment count above which the stream warns.
    pub max_live_segments: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            // A quarter of a 10 m viewport at 0.04 m per sample.
            segment_size: 62,
            lookahead_fraction: 0.10,
            retire: true,
            retire_margin_fraction: 0.10,
            max_live_segments: 64,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.segment_size == 0 {
            return Err("segment_size must be at least 1".into());
        }
        if !(self.lookahead_fraction.is_finite() && self.lookahead_fraction >= 0.0) {
            return Err(format!(
                "lookahead_fraction must be non-negative, got {}",
                self.lookahead_fraction
            ));
        }
        if !(self.retire_margin_fraction.is_finite() && self.retire_margin_fraction >= 0.0) {
            return Err(format!(
                "retire_margin_fraction must be non-negative, got {}",
                self.retire_margin_fraction
            ));
        }
        if self.max_live_segments == 0 {
            return Err("max_live_segments must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.segment_size, 62);
        assert_eq!(config.lookahead_fraction, 0.10);
        assert!(config.retire);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_segment_size_is_rejected() {
        let config = StreamConfig {
            segment_size: 0,
            ..StreamConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
