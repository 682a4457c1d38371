use crate::observation::TrialDataset;
use crate::profile::ImpairmentLevel;
use serde::{Deserialize, Serialize};

/// Accuracy is not measured by the aiming task (misses simply do not
/// advance the trial), so the uploaded figure is a fixed placeholder.
pub const ACCURACY_PLACEHOLDER: f64 = 100.0;

/// Per-session summary handed to the upload sink after completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub level: ImpairmentLevel,
    pub trial_count: usize,
    pub average_movement_time_ms: f64,
    pub accuracy_percent: f64,
}

impl SessionReport {
    pub fn from_dataset(dataset: &TrialDataset) -> Self {
        Self {
            level: dataset.level(),
            trial_count: dataset.len(),
            average_movement_time_ms: dataset.average_movement_time_ms(),
            accuracy_percent: ACCURACY_PLACEHOLDER,
        }
    }
}
