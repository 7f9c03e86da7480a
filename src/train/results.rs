//! Reading final validation metrics from a run's `results.csv`.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SignscopeError;

/// Final-epoch validation metrics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ValidationMetrics {
    pub epoch: Option<u32>,
    pub map50: f64,
    pub map50_95: f64,
    pub precision: f64,
    pub recall: f64,
}

#[derive(Debug, Deserialize)]
struct ResultsRow {
    #[serde(default)]
    epoch: Option<u32>,
    #[serde(rename = "metrics/precision(B)")]
    precision: f64,
    #[serde(rename = "metrics/recall(B)")]
    recall: f64,
    #[serde(rename = "metrics/mAP50(B)")]
    map50: f64,
    #[serde(rename = "metrics/mAP50-95(B)")]
    map50_95: f64,
}

/// Quality band for mAP@0.5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MapRating {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl MapRating {
    pub fn from_map50(map50: f64) -> Self {
        if map50 > 0.90 {
            MapRating::Excellent
        } else if map50 >= 0.80 {
            MapRating::VeryGood
        } else if map50 >= 0.70 {
            MapRating::Good
        } else if map50 >= 0.60 {
            MapRating::Fair
        } else {
            MapRating::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MapRating::Excellent => "Excellent",
            MapRating::VeryGood => "Very Good",
            MapRating::Good => "Good",
            MapRating::Fair => "Fair",
            MapRating::Poor => "Poor",
        }
    }
}

/// Read the last row of an Ultralytics `results.csv`.
///
/// Column headers are padded with spaces in the files the trainer writes,
/// so fields are trimmed before matching.
pub fn read_results_csv(path: &Path) -> Result<ValidationMetrics, SignscopeError> {
    let file = File::open(path).map_err(SignscopeError::Io)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut last: Option<ResultsRow> = None;
    for row in reader.deserialize() {
        let row: ResultsRow = row.map_err(|source| SignscopeError::ResultsCsv {
            path: path.to_path_buf(),
            source,
        })?;
        last = Some(row);
    }

    let row = last.ok_or_else(|| SignscopeError::ResultsEmpty {
        path: path.to_path_buf(),
    })?;

    Ok(ValidationMetrics {
        epoch: row.epoch,
        map50: row.map50,
        map50_95: row.map50_95,
        precision: row.precision,
        recall: row.recall,
    })
}
