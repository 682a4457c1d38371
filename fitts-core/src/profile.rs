//! Impairment profiles: named parameter sets describing how much the
//! simulated intoxication perturbs pointer input and target stability.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("unknown impairment level \"{0}\" (expected normal, mild, moderate or severe)")]
    UnknownLevel(String),
    #[error("{field} must be finite and non-negative, got {value}")]
    NegativeParameter { field: &'static str, value: f64 },
    #[error("reverse_chance must be within [0, 1], got {0}")]
    ChanceOutOfRange(f64),
}

/// Closed set of selectable impairment levels. Parsing an unrecognized
/// name is an error, never a silent fallback to `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpairmentLevel {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl ImpairmentLevel {
    pub const ALL: [ImpairmentLevel; 4] = [
        ImpairmentLevel::Normal,
        ImpairmentLevel::Mild,
        ImpairmentLevel::Moderate,
        ImpairmentLevel::Severe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpairmentLevel::Normal => "normal",
            ImpairmentLevel::Mild => "mild",
            ImpairmentLevel::Moderate => "moderate",
            ImpairmentLevel::Severe => "severe",
        }
    }

    /// The fixed parameter set for this level.
    pub fn profile(&self) -> ImpairmentProfile {
        match self {
            ImpairmentLevel::Normal => ImpairmentProfile {
                level: *self,
                delay_ms: 0,
                jitter_px: 0.0,
                reverse_chance: 0.0,
                sway_px: 0.0,
            },
            ImpairmentLevel::Mild => ImpairmentProfile {
                level: *self,
                delay_ms: 50,
                jitter_px: 3.0,
                reverse_chance: 0.05,
                sway_px: 2.0,
            },
            ImpairmentLevel::Moderate => ImpairmentProfile {
                level: *self,
                delay_ms: 100,
                jitter_px: 6.0,
                reverse_chance: 0.10,
                sway_px: 4.0,
            },
            ImpairmentLevel::Severe => ImpairmentProfile {
                level: *self,
                delay_ms: 200,
                jitter_px: 10.0,
                reverse_chance: 0.20,
                sway_px: 8.0,
            },
        }
    }
}

impl fmt::Display for ImpairmentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImpairmentLevel {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(ImpairmentLevel::Normal),
            "mild" => Ok(ImpairmentLevel::Mild),
            "moderate" => Ok(ImpairmentLevel::Moderate),
            "severe" => Ok(ImpairmentLevel::Severe),
            other => Err(ProfileError::UnknownLevel(other.to_string())),
        }
    }
}

/// Immutable perturbation parameters, fixed for a whole session.
///
/// `delay_ms` postpones click evaluation, `jitter_px` displaces the
/// pointer, `reverse_chance` mirrors it through the surface center, and
/// `sway_px` bounds the target's random drift while it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpairmentProfile {
    pub level: ImpairmentLevel,
    pub delay_ms: u64,
    pub jitter_px: f64,
    pub reverse_chance: f64,
    pub sway_px: f64,
}

impl ImpairmentProfile {
    /// Validated constructor for parameter sets outside the fixed catalog.
    pub fn custom(
        level: ImpairmentLevel,
        delay_ms: u64,
        jitter_px: f64,
        reverse_chance: f64,
        sway_px: f64,
    ) -> Result<Self, ProfileError> {
        for (field, value) in [("jitter_px", jitter_px), ("sway_px", sway_px)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ProfileError::NegativeParameter { field, value });
            }
        }
        if !(0.0..=1.0).contains(&reverse_chance) {
            return Err(ProfileError::ChanceOutOfRange(reverse_chance));
        }
        Ok(Self {
            level,
            delay_ms,
            jitter_px,
            reverse_chance,
            sway_px,
        })
    }

    pub fn perturbs_input(&self) -> bool {
        self.delay_ms > 0 || self.jitter_px > 0.0 || self.reverse_chance > 0.0
    }
}
