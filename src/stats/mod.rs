//! Prediction statistics.
//!
//! This module tallies detections per class across a directory of label files
//! and builds a [`PredictionReport`] for terminal or JSON output.

mod report;

pub use report::{
    ClassNote, ClassRow, DetectionSection, OverviewSection, PredictionReport, SampleDetection,
    SampleFile,
};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;

use crate::error::SignscopeError;
use crate::labels::corpus::{label_files_in, read_label_text};
use crate::labels::{leading_class_id, parse_label_text, PredictionLayout};
use crate::style::StyleTable;

/// Per-class detection counts accumulated over a set of label files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassTally {
    /// Number of label files scanned.
    pub label_files: usize,
    /// Valid detection records across all files.
    pub total_detections: usize,
    /// Files holding more than one valid record.
    pub multi_detection_files: usize,
    /// Detections per class id.
    pub class_counts: BTreeMap<u32, usize>,
    /// Label files containing at least one detection of each class id.
    pub class_image_counts: BTreeMap<u32, usize>,
}

impl ClassTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the contents of one label file into the tally.
    ///
    /// Returns the number of valid records found.
    pub fn add_label_text(&mut self, text: &str) -> usize {
        let records = parse_label_text(text);
        let mut classes_in_file = BTreeSet::new();

        for (_, record) in &records {
            *self.class_counts.entry(record.class_id).or_insert(0) += 1;
            classes_in_file.insert(record.class_id);
        }
        for class_id in classes_in_file {
            *self.class_image_counts.entry(class_id).or_insert(0) += 1;
        }

        self.label_files += 1;
        self.total_detections += records.len();
        if records.len() > 1 {
            self.multi_detection_files += 1;
        }

        records.len()
    }

    /// Number of distinct class ids observed.
    pub fn distinct_classes(&self) -> usize {
        self.class_counts.len()
    }

    pub fn count(&self, class_id: u32) -> usize {
        self.class_counts.get(&class_id).copied().unwrap_or(0)
    }

    /// Share of all detections belonging to `class_id`, in percent.
    ///
    /// Zero when the tally is empty.
    pub fn percentage(&self, class_id: u32) -> f64 {
        percent(self.count(class_id), self.total_detections)
    }

    /// Class counts sorted by count descending, then class id ascending.
    pub fn sorted_counts(&self) -> Vec<(u32, usize)> {
        let mut sorted: Vec<(u32, usize)> = self
            .class_counts
            .iter()
            .map(|(id, count)| (*id, *count))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }
}

/// Scan every label file in `labels_dir` into a [`ClassTally`].
pub fn aggregate(labels_dir: &Path) -> Result<ClassTally, SignscopeError> {
    let mut tally = ClassTally::new();

    for label_path in label_files_in(labels_dir)? {
        let content = read_label_text(&label_path)?;
        let found = tally.add_label_text(&content);
        tracing::debug!(file = %label_path.display(), detections = found, "tallied label file");
    }

    Ok(tally)
}

/// Options for prediction analysis.
#[derive(Clone, Debug)]
pub struct AnalyzeOptions {
    /// Number of label files to list detection by detection.
    pub sample_files: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self { sample_files: 3 }
    }
}

/// Analyze a prediction directory.
pub fn analyze_predictions(
    layout: &PredictionLayout,
    styles: &StyleTable,
    opts: &AnalyzeOptions,
) -> Result<PredictionReport, SignscopeError> {
    let total_images = layout.image_files()?.len();
    let tally = aggregate(&layout.labels_dir)?;

    let mut report = PredictionReport::from_tally(&tally, total_images, styles);
    report.samples = collect_samples(layout, opts.sample_files)?;
    Ok(report)
}

fn collect_samples(
    layout: &PredictionLayout,
    limit: usize,
) -> Result<Vec<SampleFile>, SignscopeError> {
    let mut samples = Vec::new();

    for label_path in layout.label_files()?.into_iter().take(limit) {
        let image_name = match layout.image_for_label(&label_path) {
            Some(image_path) => file_name_string(&image_path),
            None => label_path
                .with_extension("jpg")
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let content = read_label_text(&label_path)?;
        let detections = parse_label_text(&content)
            .into_iter()
            .map(|(line, record)| SampleDetection { line, record })
            .collect();

        samples.push(SampleFile {
            image_name,
            detections,
        });
    }

    Ok(samples)
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Class-range summary of a label directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassRange {
    pub label_files: usize,
    pub max_class_id: Option<u32>,
}

impl ClassRange {
    /// Class count implied by the largest id (`max + 1`), zero when empty.
    pub fn implied_classes(&self) -> usize {
        self.max_class_id.map_or(0, |max| max as usize + 1)
    }
}

/// Find the largest class id used in a label directory.
///
/// Only the first token of each line is inspected, so rows with truncated
/// geometry still count toward the class range.
pub fn class_range(labels_dir: &Path) -> Result<ClassRange, SignscopeError> {
    let files = label_files_in(labels_dir)?;
    let mut max_class_id: Option<u32> = None;

    for label_path in &files {
        let content = read_label_text(label_path)?;
        for class_id in content.lines().filter_map(leading_class_id) {
            max_class_id = Some(max_class_id.map_or(class_id, |max| max.max(class_id)));
        }
    }

    tracing::debug!(files = files.len(), "scanned label directory for class range");

    Ok(ClassRange {
        label_files: files.len(),
        max_class_id,
    })
}

pub(crate) fn percent(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        (numerator as f64 / denominator as f64) * 100.0
    }
}
