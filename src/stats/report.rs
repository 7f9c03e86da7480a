//! Prediction report types and terminal formatting.
//!
//! The report can be rendered as text (Display) or serialized as JSON.

use serde::Serialize;
use std::fmt;

use super::{percent, ClassTally};
use crate::labels::DetectionRecord;
use crate::style::StyleTable;

/// The result of analyzing a prediction directory.
#[derive(Clone, Debug, Serialize)]
pub struct PredictionReport {
    pub overview: OverviewSection,
    pub detections: DetectionSection,
    /// Per-class breakdown, sorted by count descending.
    pub classes: Vec<ClassRow>,
    /// First few label files listed detection by detection.
    pub samples: Vec<SampleFile>,
    /// Descriptions for observed classes that have one.
    pub class_notes: Vec<ClassNote>,
}

/// Image and label-file coverage.
#[derive(Clone, Debug, Default, Serialize)]
pub struct OverviewSection {
    pub total_images: usize,
    pub labeled_images: usize,
    pub unlabeled_images: usize,
    /// Labeled over total, in percent; zero when there are no images.
    pub coverage_pct: f64,
}

/// Detection totals.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DetectionSection {
    pub total: usize,
    /// `None` when no label files were found.
    pub avg_per_labeled_image: Option<f64>,
    pub multi_detection_images: usize,
    pub distinct_classes: usize,
}

/// One row of the class distribution table.
#[derive(Clone, Debug, Serialize)]
pub struct ClassRow {
    pub class_id: u32,
    pub name: String,
    pub count: usize,
    /// Label files containing this class.
    pub images: usize,
    /// Share of all detections, in percent.
    pub percentage: f64,
}

impl ClassRow {
    /// One glyph per two percentage points, rounded down.
    pub fn bar(&self) -> String {
        "█".repeat((self.percentage / 2.0).floor() as usize)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SampleFile {
    pub image_name: String,
    pub detections: Vec<SampleDetection>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SampleDetection {
    /// 1-based line number in the label file.
    pub line: usize,
    pub record: DetectionRecord,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClassNote {
    pub class_id: u32,
    pub description: String,
}

impl PredictionReport {
    /// Build the report sections from a finished tally.
    ///
    /// `samples` is left empty; [`super::analyze_predictions`] fills it.
    pub fn from_tally(tally: &ClassTally, total_images: usize, styles: &StyleTable) -> Self {
        let labeled_images = tally.label_files;

        let overview = OverviewSection {
            total_images,
            labeled_images,
            unlabeled_images: total_images.saturating_sub(labeled_images),
            coverage_pct: percent(labeled_images, total_images),
        };

        let detections = DetectionSection {
            total: tally.total_detections,
            avg_per_labeled_image: if labeled_images > 0 {
                Some(tally.total_detections as f64 / labeled_images as f64)
            } else {
                None
            },
            multi_detection_images: tally.multi_detection_files,
            distinct_classes: tally.distinct_classes(),
        };

        let classes = tally
            .sorted_counts()
            .into_iter()
            .map(|(class_id, count)| ClassRow {
                class_id,
                name: styles.name(class_id),
                count,
                images: tally
                    .class_image_counts
                    .get(&class_id)
                    .copied()
                    .unwrap_or(0),
                percentage: percent(count, tally.total_detections),
            })
            .collect();

        let class_notes = tally
            .class_counts
            .keys()
            .filter_map(|&class_id| {
                styles.description(class_id).map(|description| ClassNote {
                    class_id,
                    description: description.to_string(),
                })
            })
            .collect();

        PredictionReport {
            overview,
            detections,
            classes,
            samples: Vec::new(),
            class_notes,
        }
    }
}

impl fmt::Display for PredictionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "╭─────────────────────────────────────────────────────────────╮"
        )?;
        writeln!(
            f,
            "│          🚦  Traffic Sign Prediction Analysis               │"
        )?;
        writeln!(
            f,
            "╰─────────────────────────────────────────────────────────────╯"
        )?;
        writeln!(f)?;

        self.fmt_overview(f)?;
        writeln!(f)?;
        self.fmt_detections(f)?;
        writeln!(f)?;
        self.fmt_classes(f)?;

        if !self.samples.is_empty() {
            writeln!(f)?;
            self.fmt_samples(f)?;
        }

        if !self.class_notes.is_empty() {
            writeln!(f)?;
            self.fmt_class_notes(f)?;
        }

        Ok(())
    }
}

impl PredictionReport {
    fn fmt_overview(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.overview;
        section_header(f, "Dataset Overview")?;
        writeln!(f, "│   Total images:            {:>8}", format_number(o.total_images))?;
        writeln!(f, "│   Images with labels:      {:>8}", format_number(o.labeled_images))?;
        writeln!(f, "│   Images without labels:   {:>8}", format_number(o.unlabeled_images))?;
        writeln!(f, "│   Coverage:                {:>7.1}%", o.coverage_pct)?;
        section_footer(f)
    }

    fn fmt_detections(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.detections;
        section_header(f, "Detection Statistics")?;
        writeln!(f, "│   Total detections:        {:>8}", format_number(d.total))?;
        let avg = d
            .avg_per_labeled_image
            .map(|avg| format!("{avg:.2}"))
            .unwrap_or_else(|| "n/a".to_string());
        writeln!(f, "│   Avg detections/image:    {:>8}", avg)?;
        writeln!(
            f,
            "│   Images with multiple:    {:>8}",
            format_number(d.multi_detection_images)
        )?;
        writeln!(
            f,
            "│   Distinct classes:        {:>8}",
            format_number(d.distinct_classes)
        )?;
        section_footer(f)
    }

    fn fmt_classes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section_header(f, "Class Distribution")?;

        if self.classes.is_empty() {
            writeln!(f, "│   No detections found.")?;
        } else {
            writeln!(
                f,
                "│   {:<8} {:<16} {:>7} {:>7} {:>8}  Bar",
                "Class", "Name", "Count", "Images", "Share"
            )?;
            writeln!(
                f,
                "│   {} {} {} {} {}  {}",
                "─".repeat(8),
                "─".repeat(16),
                "─".repeat(7),
                "─".repeat(7),
                "─".repeat(8),
                "─".repeat(30)
            )?;
            for row in &self.classes {
                writeln!(
                    f,
                    "│   {:<8} {:<16} {:>7} {:>7} {:>7.2}%  {}",
                    row.class_id,
                    truncate_label(&row.name, 16),
                    format_number(row.count),
                    format_number(row.images),
                    row.percentage,
                    row.bar()
                )?;
            }
        }

        section_footer(f)
    }

    fn fmt_samples(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section_header(f, "Sample Predictions")?;
        for (idx, sample) in self.samples.iter().enumerate() {
            if idx > 0 {
                writeln!(f, "│")?;
            }
            writeln!(f, "│   Image: {}", sample.image_name)?;
            if sample.detections.is_empty() {
                writeln!(f, "│     (no valid detections)")?;
            }
            for detection in &sample.detections {
                let r = &detection.record;
                writeln!(
                    f,
                    "│     Detection {}: Class {} at ({}, {}) size ({}, {})",
                    detection.line, r.class_id, r.cx, r.cy, r.w, r.h
                )?;
            }
        }
        section_footer(f)
    }

    fn fmt_class_notes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section_header(f, "Class Notes")?;
        for note in &self.class_notes {
            writeln!(f, "│   Class {}: {}", note.class_id, note.description)?;
        }
        section_footer(f)
    }
}

fn section_header(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(
        f,
        "┌─ {} {}",
        title,
        "─".repeat(58usize.saturating_sub(title.chars().count()))
    )?;
    writeln!(f, "│")
}

fn section_footer(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "│")?;
    writeln!(
        f,
        "└─────────────────────────────────────────────────────────────"
    )
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Truncate a label to fit in the display column.
fn truncate_label(label: &str, max_len: usize) -> String {
    if label.chars().count() <= max_len {
        label.to_string()
    } else {
        let kept: String = label.chars().take(max_len - 1).collect();
        format!("{kept}…")
    }
}
