use crate::pipeline::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinary least-squares fit of `MT = intercept + slope * ID`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub intercept: f64,
    pub slope: f64,
    pub r_squared: f64,
}

impl RegressionResult {
    pub fn strength(&self) -> FitStrength {
        FitStrength::from_r_squared(self.r_squared)
    }

    pub fn predict(&self, index_of_difficulty: f64) -> f64 {
        self.intercept + self.slope * index_of_difficulty
    }
}

/// Qualitative classification of the fit quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitStrength {
    Strong,
    Moderate,
    Weak,
}

impl FitStrength {
    pub fn from_r_squared(r_squared: f64) -> Self {
        if r_squared >= 0.8 {
            FitStrength::Strong
        } else if r_squared >= 0.5 {
            FitStrength::Moderate
        } else {
            FitStrength::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FitStrength::Strong => "strong",
            FitStrength::Moderate => "moderate",
            FitStrength::Weak => "weak",
        }
    }
}

impl fmt::Display for FitStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fits a line through `(index_of_difficulty, movement_time)` points.
/// At least two distinct x values are required.
pub fn linear_fit(points: &[(f64, f64)]) -> Result<RegressionResult, AnalysisError> {
    let mut distinct: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    distinct.sort_by(|a, b| a.partial_cmp(b).expect("non-finite difficulty"));
    distinct.dedup();
    if distinct.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            points: distinct.len(),
        });
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = points
        .iter()
        .map(|(x, y)| {
            let predicted = intercept + slope * x;
            (y - predicted).powi(2)
        })
        .sum();
    let ss_tot: f64 = points.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();

    // All residuals are zero when the response is constant, so the line
    // explains everything there is to explain.
    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    Ok(RegressionResult {
        intercept,
        slope,
        r_squared,
    })
}
