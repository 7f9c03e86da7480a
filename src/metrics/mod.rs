//! Training run inspection.
//!
//! Checks which plots a training run produced, reads their dimensions, gives
//! a rough accuracy hint from the normalized confusion matrix and shows the
//! final validation metrics. A failure on one artifact never stops the rest.

mod report;

pub use report::RunReport;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::SignscopeError;
use crate::overlay::load_rgb;
use crate::train::{read_results_csv, MapRating, ValidationMetrics};

/// Artifact families written by a training run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ArtifactGroup {
    PerformanceCurves,
    ConfusionMatrices,
    ValidationExamples,
}

impl ArtifactGroup {
    pub fn title(&self) -> &'static str {
        match self {
            ArtifactGroup::PerformanceCurves => "Performance Curves",
            ArtifactGroup::ConfusionMatrices => "Confusion Matrices",
            ArtifactGroup::ValidationExamples => "Validation Examples",
        }
    }
}

/// Expected artifacts: group, file name, description.
pub const RUN_ARTIFACTS: [(ArtifactGroup, &str, &str); 8] = [
    (ArtifactGroup::PerformanceCurves, "F1_curve.png", "F1 score vs confidence"),
    (ArtifactGroup::PerformanceCurves, "P_curve.png", "Precision vs confidence"),
    (ArtifactGroup::PerformanceCurves, "R_curve.png", "Recall vs confidence"),
    (ArtifactGroup::PerformanceCurves, "PR_curve.png", "Precision-recall curve"),
    (ArtifactGroup::ConfusionMatrices, "confusion_matrix.png", "Confusion matrix"),
    (
        ArtifactGroup::ConfusionMatrices,
        NORMALIZED_CONFUSION_MATRIX,
        "Normalized confusion matrix",
    ),
    (ArtifactGroup::ValidationExamples, "val_batch0_labels.jpg", "Ground truth labels"),
    (ArtifactGroup::ValidationExamples, "val_batch0_pred.jpg", "Model predictions"),
];

pub const NORMALIZED_CONFUSION_MATRIX: &str = "confusion_matrix_normalized.png";
pub const RESULTS_CSV: &str = "results.csv";

/// What was found for one expected artifact.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Present { width: usize, height: usize, size_kb: f64 },
    Missing,
    Unreadable { message: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct ArtifactEntry {
    pub group: ArtifactGroup,
    pub file_name: String,
    pub description: String,
    pub status: ArtifactStatus,
}

/// Brightness-based hint derived from the normalized confusion matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BrightnessVerdict {
    LikelyHighAccuracy,
    ModerateAccuracy,
    PossibleIssues,
}

impl BrightnessVerdict {
    /// Classify a mean channel value in `0..=255`.
    pub fn from_mean(mean: f64) -> Self {
        if mean > 200.0 {
            BrightnessVerdict::LikelyHighAccuracy
        } else if mean > 150.0 {
            BrightnessVerdict::ModerateAccuracy
        } else {
            BrightnessVerdict::PossibleIssues
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            BrightnessVerdict::LikelyHighAccuracy => "likely high accuracy (bright diagonal)",
            BrightnessVerdict::ModerateAccuracy => "moderate accuracy",
            BrightnessVerdict::PossibleIssues => "may have accuracy issues",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BrightnessAssessment {
    pub mean: f64,
    pub verdict: BrightnessVerdict,
}

/// A section that may fail on its own without aborting the report.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome<T> {
    Ok { value: T },
    Missing,
    Failed { message: String },
}

impl<T> SectionOutcome<T> {
    fn from_result(path: &Path, result: impl FnOnce() -> Result<T, SignscopeError>) -> Self {
        if !path.is_file() {
            return SectionOutcome::Missing;
        }
        match result() {
            Ok(value) => SectionOutcome::Ok { value },
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not read artifact");
                SectionOutcome::Failed {
                    message: err.to_string(),
                }
            }
        }
    }
}

/// Final metrics with their mAP@0.5 band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RatedMetrics {
    pub metrics: ValidationMetrics,
    pub rating: MapRating,
}

/// Inspect every expected artifact of `run_dir`.
pub fn inspect_run(run_dir: &Path) -> Result<RunReport, SignscopeError> {
    if !run_dir.is_dir() {
        return Err(SignscopeError::DirectoryNotFound {
            path: run_dir.to_path_buf(),
        });
    }

    let artifacts = RUN_ARTIFACTS
        .iter()
        .map(|(group, file_name, description)| ArtifactEntry {
            group: *group,
            file_name: file_name.to_string(),
            description: description.to_string(),
            status: artifact_status(&run_dir.join(file_name)),
        })
        .collect();

    let matrix_path = run_dir.join(NORMALIZED_CONFUSION_MATRIX);
    let brightness = SectionOutcome::from_result(&matrix_path, || assess_brightness(&matrix_path));

    let results_path = run_dir.join(RESULTS_CSV);
    let metrics = SectionOutcome::from_result(&results_path, || {
        read_results_csv(&results_path).map(|metrics| RatedMetrics {
            rating: MapRating::from_map50(metrics.map50),
            metrics,
        })
    });

    Ok(RunReport {
        run_dir: run_dir.to_path_buf(),
        artifacts,
        brightness,
        metrics,
    })
}

fn artifact_status(path: &Path) -> ArtifactStatus {
    if !path.is_file() {
        return ArtifactStatus::Missing;
    }

    let dimensions = imagesize::size(path).map_err(|source| SignscopeError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    });
    let size = fs::metadata(path).map_err(SignscopeError::Io);

    match (dimensions, size) {
        (Ok(dim), Ok(meta)) => ArtifactStatus::Present {
            width: dim.width,
            height: dim.height,
            size_kb: meta.len() as f64 / 1024.0,
        },
        (Err(err), _) | (_, Err(err)) => {
            tracing::warn!(path = %path.display(), error = %err, "could not read artifact");
            ArtifactStatus::Unreadable {
                message: err.to_string(),
            }
        }
    }
}

/// Mean RGB channel value of an image file.
pub fn assess_brightness(path: &Path) -> Result<BrightnessAssessment, SignscopeError> {
    let image = load_rgb(path)?;
    let mean = mean_channel_value(&image);
    Ok(BrightnessAssessment {
        mean,
        verdict: BrightnessVerdict::from_mean(mean),
    })
}

/// Mean over every channel of every pixel; zero for an empty image.
pub fn mean_channel_value(image: &image::RgbImage) -> f64 {
    let raw = image.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    let sum: u64 = raw.iter().map(|&v| v as u64).sum();
    sum as f64 / raw.len() as f64
}

/// Paths of the expected artifacts that are missing.
pub fn missing_artifacts(report: &RunReport) -> Vec<PathBuf> {
    report
        .artifacts
        .iter()
        .filter(|entry| entry.status == ArtifactStatus::Missing)
        .map(|entry| report.run_dir.join(&entry.file_name))
        .collect()
}
