pub mod pipeline;
pub mod regression;
pub mod stats;

pub use pipeline::{
    aggregate, analyze, analyze_batch, clean, derive_difficulty, filter_outliers,
    index_of_difficulty, AnalysisError, AnalysisReport, DerivedRecord,
};
pub use regression::{linear_fit, FitStrength, RegressionResult};
