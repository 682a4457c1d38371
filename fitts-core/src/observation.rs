//! Per-trial observations and the dataset a completed session yields.

use crate::profile::ImpairmentLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ObservationError {
    #[error("trial_index must be >= 1")]
    ZeroTrialIndex,
    #[error("target_diameter_px must be positive, got {0}")]
    NonPositiveDiameter(f64),
    #[error("distance_px must be non-negative and finite, got {0}")]
    InvalidDistance(f64),
    #[error("movement_time_ms must be strictly positive, got {0}")]
    NonPositiveTime(f64),
}

/// One successful target acquisition. Misses produce no observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialObservation {
    pub trial_index: usize,
    pub target_diameter_px: f64,
    pub distance_px: f64,
    pub movement_time_ms: f64,
}

impl TrialObservation {
    /// Validating constructor. A zero or negative elapsed time signals a
    /// clock or sequencing fault and is rejected rather than recorded.
    pub fn new(
        trial_index: usize,
        target_diameter_px: f64,
        distance_px: f64,
        movement_time_ms: f64,
    ) -> Result<Self, ObservationError> {
        if trial_index == 0 {
            return Err(ObservationError::ZeroTrialIndex);
        }
        if !(target_diameter_px > 0.0) || !target_diameter_px.is_finite() {
            return Err(ObservationError::NonPositiveDiameter(target_diameter_px));
        }
        if !(distance_px >= 0.0) || !distance_px.is_finite() {
            return Err(ObservationError::InvalidDistance(distance_px));
        }
        if !(movement_time_ms > 0.0) || !movement_time_ms.is_finite() {
            return Err(ObservationError::NonPositiveTime(movement_time_ms));
        }
        Ok(Self {
            trial_index,
            target_diameter_px,
            distance_px,
            movement_time_ms,
        })
    }
}

/// Ordered observations from one session, labeled with the impairment
/// level they were collected under. Append-only while the session runs;
/// the controller hands it out by value once finalized, after which
/// nothing holds a mutable path to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialDataset {
    level: ImpairmentLevel,
    observations: Vec<TrialObservation>,
}

impl TrialDataset {
    pub fn new(level: ImpairmentLevel) -> Self {
        Self {
            level,
            observations: Vec::new(),
        }
    }

    pub fn from_observations(level: ImpairmentLevel, observations: Vec<TrialObservation>) -> Self {
        Self {
            level,
            observations,
        }
    }

    pub fn push(&mut self, observation: TrialObservation) {
        self.observations.push(observation);
    }

    pub fn level(&self) -> ImpairmentLevel {
        self.level
    }

    pub fn observations(&self) -> &[TrialObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Mean movement time, 0.0 for an empty dataset.
    pub fn average_movement_time_ms(&self) -> f64 {
        if self.observations.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.observations.iter().map(|o| o.movement_time_ms).sum();
        sum / self.observations.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_time() {
        assert_eq!(
            TrialObservation::new(1, 40.0, 100.0, 0.0),
            Err(ObservationError::NonPositiveTime(0.0))
        );
        assert_eq!(
            TrialObservation::new(1, 40.0, 100.0, -5.0),
            Err(ObservationError::NonPositiveTime(-5.0))
        );
    }

    #[test]
    fn rejects_non_positive_diameter() {
        assert_eq!(
            TrialObservation::new(1, 0.0, 100.0, 250.0),
            Err(ObservationError::NonPositiveDiameter(0.0))
        );
    }

    #[test]
    fn average_of_empty_dataset_is_zero() {
        let dataset = TrialDataset::new(ImpairmentLevel::Normal);
        assert_eq!(dataset.average_movement_time_ms(), 0.0);
    }

    #[test]
    fn average_is_arithmetic_mean() {
        let mut dataset = TrialDataset::new(ImpairmentLevel::Mild);
        dataset.push(TrialObservation::new(1, 40.0, 100.0, 200.0).unwrap());
        dataset.push(TrialObservation::new(2, 40.0, 100.0, 400.0).unwrap());
        assert_eq!(dataset.average_movement_time_ms(), 300.0);
    }
}
