use fitts_core::Surface;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("trial_count must be >= 1")]
    ZeroTrialCount,
    #[error("surface dimensions must be positive, got {width}x{height}")]
    InvalidSurface { width: f64, height: f64 },
    #[error("invalid radius bounds: min {min_px} px, max {max_px} px")]
    InvalidRadiusBounds { min_px: f64, max_px: f64 },
    #[error("max radius {max_px} px cannot fit a {width}x{height} surface")]
    RadiusExceedsSurface {
        max_px: f64,
        width: f64,
        height: f64,
    },
}

/// Session parameters, validated once at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub trial_count: usize,
    pub min_radius_px: f64,
    pub max_radius_px: f64,
    pub surface: Surface,
    /// Seconds displayed before the first target; 3 counts down 3..0.
    pub countdown_secs: u64,
    /// Slack added to the target radius so rounding at the rim does not
    /// register as a miss.
    pub hit_tolerance_px: f64,
    /// Cadence at which the target sway offset is re-rolled.
    pub sway_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trial_count: 10,
            min_radius_px: 20.0,
            max_radius_px: 100.0,
            surface: Surface::new(800.0, 600.0),
            countdown_secs: 3,
            hit_tolerance_px: 1.5,
            sway_interval_ms: 50,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.trial_count == 0 {
            return Err(ConfigurationError::ZeroTrialCount);
        }
        if !self.surface.is_valid() {
            return Err(ConfigurationError::InvalidSurface {
                width: self.surface.width,
                height: self.surface.height,
            });
        }
        if !(self.min_radius_px > 0.0) || self.min_radius_px > self.max_radius_px {
            return Err(ConfigurationError::InvalidRadiusBounds {
                min_px: self.min_radius_px,
                max_px: self.max_radius_px,
            });
        }
        // The whole circle must fit: center range [r, side - r] collapses
        // once 2r exceeds either side.
        if self.max_radius_px * 2.0 > self.surface.width
            || self.max_radius_px * 2.0 > self.surface.height
        {
            return Err(ConfigurationError::RadiusExceedsSurface {
                max_px: self.max_radius_px,
                width: self.surface.width,
                height: self.surface.height,
            });
        }
        Ok(())
    }
}
