//! Flat delimited record store for trial datasets.
//!
//! One file per (subject, impairment level) pair; naming and location
//! are the caller's concern. The column order is fixed and loading is
//! strict: rows that fail to parse or violate an invariant are skipped
//! and counted, never coerced into the dataset.

use fitts_core::{ImpairmentLevel, TrialDataset, TrialObservation};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

const HEADER: [&str; 4] = ["Trial", "Target Size (px)", "Distance (px)", "Time (ms)"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("unexpected header: expected {expected:?}, found {found:?}")]
    HeaderMismatch { expected: String, found: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct Row {
    #[serde(rename = "Trial")]
    trial: usize,
    #[serde(rename = "Target Size (px)")]
    target_size_px: f64,
    #[serde(rename = "Distance (px)")]
    distance_px: f64,
    #[serde(rename = "Time (ms)")]
    time_ms: f64,
}

/// A loaded dataset plus the number of rows rejected on the way in.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub dataset: TrialDataset,
    pub skipped_rows: usize,
}

pub fn write_csv<W: Write>(writer: W, dataset: &TrialDataset) -> Result<(), StoreError> {
    // Header written up front so an empty dataset still round-trips.
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    out.write_record(HEADER)?;
    for observation in dataset.observations() {
        out.serialize(Row {
            trial: observation.trial_index,
            target_size_px: observation.target_diameter_px,
            distance_px: observation.distance_px,
            time_ms: observation.movement_time_ms,
        })?;
    }
    out.flush().map_err(StoreError::from)?;
    Ok(())
}

pub fn read_csv<R: Read>(reader: R, level: ImpairmentLevel) -> Result<LoadedDataset, StoreError> {
    let mut input = csv::Reader::from_reader(reader);

    let found = input.headers()?.clone();
    if found.iter().collect::<Vec<_>>() != HEADER {
        return Err(StoreError::HeaderMismatch {
            expected: HEADER.join(","),
            found: found.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut dataset = TrialDataset::new(level);
    let mut skipped_rows = 0;
    for (line, result) in input.deserialize::<Row>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                warn!(line = line + 2, %err, "skipping unparseable row");
                skipped_rows += 1;
                continue;
            }
        };
        match TrialObservation::new(row.trial, row.target_size_px, row.distance_px, row.time_ms)
        {
            Ok(observation) => dataset.push(observation),
            Err(err) => {
                warn!(line = line + 2, %err, "skipping invalid row");
                skipped_rows += 1;
            }
        }
    }
    Ok(LoadedDataset {
        dataset,
        skipped_rows,
    })
}

pub fn save_dataset(path: &Path, dataset: &TrialDataset) -> Result<(), StoreError> {
    write_csv(File::create(path)?, dataset)
}

pub fn load_dataset(path: &Path, level: ImpairmentLevel) -> Result<LoadedDataset, StoreError> {
    read_csv(File::open(path)?, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> TrialDataset {
        TrialDataset::from_observations(
            ImpairmentLevel::Mild,
            vec![
                TrialObservation::new(1, 80.0, 233.24, 512.75).unwrap(),
                TrialObservation::new(2, 46.5, 120.0, 301.5).unwrap(),
                TrialObservation::new(3, 200.0, 399.9, 850.25).unwrap(),
            ],
        )
    }

    #[test]
    fn round_trip_reproduces_every_field() {
        let dataset = sample_dataset();
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &dataset).unwrap();
        let loaded = read_csv(buffer.as_slice(), ImpairmentLevel::Mild).unwrap();
        assert_eq!(loaded.skipped_rows, 0);
        assert_eq!(loaded.dataset, dataset);
    }

    #[test]
    fn header_matches_the_store_format() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &sample_dataset()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("Trial,Target Size (px),Distance (px),Time (ms)\n"));
    }

    #[test]
    fn malformed_rows_are_skipped_and_counted() {
        let input = "\
Trial,Target Size (px),Distance (px),Time (ms)
1,80,233.2,512.7
2,eighty,120.0,301.5
3,-40,120.0,301.5
4,46,0.0,-10.0
5,46,130.0,290.0
";
        let loaded = read_csv(input.as_bytes(), ImpairmentLevel::Normal).unwrap();
        assert_eq!(loaded.skipped_rows, 3);
        assert_eq!(loaded.dataset.len(), 2);
        assert_eq!(loaded.dataset.observations()[0].trial_index, 1);
        assert_eq!(loaded.dataset.observations()[1].trial_index, 5);
    }

    #[test]
    fn wrong_header_is_an_error() {
        let input = "Trial,Size,Distance,Time\n1,80,233.2,512.7\n";
        let err = read_csv(input.as_bytes(), ImpairmentLevel::Normal).unwrap_err();
        assert!(matches!(err, StoreError::HeaderMismatch { .. }));
    }

    #[test]
    fn empty_dataset_round_trips() {
        let empty = TrialDataset::new(ImpairmentLevel::Normal);
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &empty).unwrap();
        let loaded = read_csv(buffer.as_slice(), ImpairmentLevel::Normal).unwrap();
        assert_eq!(loaded.dataset, empty);
    }

    #[test]
    fn empty_file_with_header_loads_empty_dataset() {
        let input = "Trial,Target Size (px),Distance (px),Time (ms)\n";
        let loaded = read_csv(input.as_bytes(), ImpairmentLevel::Severe).unwrap();
        assert!(loaded.dataset.is_empty());
        assert_eq!(loaded.skipped_rows, 0);
    }
}
