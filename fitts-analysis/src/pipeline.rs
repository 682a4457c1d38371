//! Outlier-robust regression pipeline for completed trial datasets.
//!
//! Fixed stage order: clean, derive difficulty, filter movement-time
//! outliers, aggregate repeated difficulty values, fit, classify. Each
//! stage is a pure function over its input, so the whole pipeline is
//! safely re-runnable, and batched datasets run in full isolation (one
//! dataset's outlier bounds never influence another's).

use crate::regression::{linear_fit, FitStrength, RegressionResult};
use crate::stats::{mean, percentile, sample_std};
use fitts_core::{ImpairmentLevel, TrialDataset, TrialObservation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("insufficient data: {points} aggregated point(s), need at least 2")]
    InsufficientData { points: usize },
}

/// Shannon formulation of the two-point aiming difficulty:
/// `log2(2 * distance / target_size + 1)`.
pub fn index_of_difficulty(distance_px: f64, target_diameter_px: f64) -> f64 {
    (2.0 * distance_px / target_diameter_px + 1.0).log2()
}

/// Analysis-time row: difficulty paired with the observed movement time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedRecord {
    pub index_of_difficulty: f64,
    pub movement_time_ms: f64,
}

/// Stage 1: drop rows that violate the positivity invariants. Returns
/// the surviving rows and the dropped count.
pub fn clean(observations: &[TrialObservation]) -> (Vec<TrialObservation>, usize) {
    let kept: Vec<TrialObservation> = observations
        .iter()
        .copied()
        .filter(|o| {
            o.distance_px > 0.0
                && o.target_diameter_px > 0.0
                && o.movement_time_ms > 0.0
                && o.distance_px.is_finite()
                && o.target_diameter_px.is_finite()
                && o.movement_time_ms.is_finite()
        })
        .collect();
    let dropped = observations.len() - kept.len();
    (kept, dropped)
}

/// Stage 2: difficulty per row.
pub fn derive_difficulty(observations: &[TrialObservation]) -> Vec<DerivedRecord> {
    observations
        .iter()
        .map(|o| DerivedRecord {
            index_of_difficulty: index_of_difficulty(o.distance_px, o.target_diameter_px),
            movement_time_ms: o.movement_time_ms,
        })
        .collect()
}

/// Stage 3: IQR/σ outlier filter on movement time.
///
/// Lower bound is `Q1 - 1.5·IQR`. The upper bound is the tighter of
/// `Q3 + 1.0·IQR` and `mean + 2·σ` (sample σ). Bounds are inclusive;
/// discarded rows are only counted, never re-examined.
pub fn filter_outliers(records: &[DerivedRecord]) -> (Vec<DerivedRecord>, usize) {
    if records.is_empty() {
        return (Vec::new(), 0);
    }
    let times: Vec<f64> = records.iter().map(|r| r.movement_time_ms).collect();
    let q1 = percentile(&times, 0.25);
    let q3 = percentile(&times, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper_iqr = q3 + 1.0 * iqr;
    let upper_std = mean(&times) + 2.0 * sample_std(&times);
    let upper = upper_iqr.min(upper_std);

    let kept: Vec<DerivedRecord> = records
        .iter()
        .copied()
        .filter(|r| r.movement_time_ms >= lower && r.movement_time_ms <= upper)
        .collect();
    let removed = records.len() - kept.len();
    (kept, removed)
}

/// Stage 4: average movement times across rows whose difficulty rounds
/// to the same 2-decimal value. Keyed on centi-bits in a `BTreeMap`, so
/// input order cannot affect the result.
pub fn aggregate(records: &[DerivedRecord]) -> Vec<(f64, f64)> {
    use std::collections::BTreeMap;

    let mut groups: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for record in records {
        let key = (record.index_of_difficulty * 100.0).round() as i64;
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += record.movement_time_ms;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(key, (sum, count))| (key as f64 / 100.0, sum / count as f64))
        .collect()
}

/// Full pipeline output for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub level: ImpairmentLevel,
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub outliers_removed: usize,
    /// Aggregated `(index_of_difficulty, mean_movement_time_ms)` points
    /// the regression was fit over, in ascending difficulty order.
    pub points: Vec<(f64, f64)>,
    pub regression: RegressionResult,
    pub strength: FitStrength,
}

/// Runs stages 1-6 over a single dataset.
pub fn analyze(dataset: &TrialDataset) -> Result<AnalysisReport, AnalysisError> {
    let (cleaned, rows_dropped) = clean(dataset.observations());
    let derived = derive_difficulty(&cleaned);
    let (filtered, outliers_removed) = filter_outliers(&derived);
    let points = aggregate(&filtered);
    debug!(
        level = %dataset.level(),
        loaded = dataset.len(),
        dropped = rows_dropped,
        outliers = outliers_removed,
        aggregated = points.len(),
        "analysis stages complete"
    );
    let regression = linear_fit(&points)?;
    Ok(AnalysisReport {
        level: dataset.level(),
        rows_loaded: dataset.len(),
        rows_dropped,
        outliers_removed,
        points,
        regression,
        strength: regression.strength(),
    })
}

/// Runs the pipeline once per dataset, in isolation. Thresholds and
/// groups are computed from each dataset alone, so impairment levels
/// never contaminate each other.
pub fn analyze_batch(
    datasets: &[TrialDataset],
) -> Vec<(ImpairmentLevel, Result<AnalysisReport, AnalysisError>)> {
    datasets
        .iter()
        .map(|dataset| (dataset.level(), analyze(dataset)))
        .collect()
}
