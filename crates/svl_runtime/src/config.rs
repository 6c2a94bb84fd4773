//! Playback configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use svl_core::{CoreError, CoreResult};

/// Playback timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Delay between deltas at speed 1.0
    pub base_interval_ms: u64,
    /// Initial speed factor
    pub speed: f64,
    /// Lowest accepted speed factor
    pub min_speed: f64,
    /// Highest accepted speed factor
    pub max_speed: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 500,
            speed: 1.0,
            min_speed: 0.25,
            max_speed: 8.0,
        }
    }
}

impl PlaybackConfig {
    /// Load and validate a JSON config file
    ///
    /// Missing fields take their default.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON, or
    /// fails [`validate`](Self::validate)
    pub fn from_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| CoreError::InvalidConfig {
            reason: format!("failed to read {}: {err}", path.display()),
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|err| CoreError::InvalidConfig {
            reason: format!("{}: {err}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every interval and speed is positive and ordered
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] naming the first bad field
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |reason: &str| {
            Err(CoreError::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if self.base_interval_ms == 0 {
            return invalid("base_interval_ms must be positive");
        }
        if !(self.min_speed.is_finite() && self.min_speed > 0.0) {
            return invalid("min_speed must be positive");
        }
        if !(self.max_speed.is_finite() && self.max_speed >= self.min_speed) {
            return invalid("max_speed must be at least min_speed");
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return invalid("speed must be positive");
        }
        Ok(())
    }

    /// Clamp a speed factor into `[min_speed, max_speed]`
    ///
    /// NaN maps to 1.0 before clamping.
    #[must_use]
    pub fn clamp_speed(&self, factor: f64) -> f64 {
        let factor = if factor.is_nan() { 1.0 } else { factor };
        factor.clamp(self.min_speed, self.max_speed)
    }

    /// Delay between ticks at `speed`
    #[must_use]
    pub fn interval(&self, speed: f64) -> Duration {
        Duration::from_millis(self.base_interval_ms).div_f64(self.clamp_speed(speed))
    }
}
