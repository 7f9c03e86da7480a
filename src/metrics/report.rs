//! Terminal formatting for run inspection.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::{
    ArtifactEntry, ArtifactGroup, ArtifactStatus, BrightnessAssessment, RatedMetrics,
    SectionOutcome,
};

/// Result of inspecting a training run directory.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub run_dir: PathBuf,
    pub artifacts: Vec<ArtifactEntry>,
    pub brightness: SectionOutcome<BrightnessAssessment>,
    pub metrics: SectionOutcome<RatedMetrics>,
}

impl RunReport {
    pub fn present_count(&self) -> usize {
        self.artifacts
            .iter()
            .filter(|entry| matches!(entry.status, ArtifactStatus::Present { .. }))
            .count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Training Results Analysis")?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "Run directory: {}", self.run_dir.display())?;

        for group in [
            ArtifactGroup::PerformanceCurves,
            ArtifactGroup::ConfusionMatrices,
            ArtifactGroup::ValidationExamples,
        ] {
            writeln!(f)?;
            writeln!(f, "{}:", group.title())?;
            for entry in self.artifacts.iter().filter(|entry| entry.group == group) {
                fmt_artifact(f, entry)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Confusion Matrix Assessment:")?;
        match &self.brightness {
            SectionOutcome::Ok { value } => {
                writeln!(f, "  Mean brightness: {:.1}", value.mean)?;
                writeln!(f, "  → {}", value.verdict.describe())?;
            }
            SectionOutcome::Missing => writeln!(f, "  ✗ normalized confusion matrix not found")?,
            SectionOutcome::Failed { message } => writeln!(f, "  ✗ {message}")?,
        }

        writeln!(f)?;
        writeln!(f, "Final Validation Metrics:")?;
        match &self.metrics {
            SectionOutcome::Ok { value } => {
                let m = &value.metrics;
                if let Some(epoch) = m.epoch {
                    writeln!(f, "  Epoch:        {epoch}")?;
                }
                writeln!(f, "  mAP@0.5:      {:.4}", m.map50)?;
                writeln!(f, "  mAP@0.5:0.95: {:.4}", m.map50_95)?;
                writeln!(f, "  Precision:    {:.4}", m.precision)?;
                writeln!(f, "  Recall:       {:.4}", m.recall)?;
                writeln!(f, "  Rating:       {}", value.rating.label())?;
            }
            SectionOutcome::Missing => writeln!(f, "  ✗ results.csv not found")?,
            SectionOutcome::Failed { message } => writeln!(f, "  ✗ {message}")?,
        }

        writeln!(f)?;
        writeln!(f, "mAP@0.5 reference:")?;
        writeln!(f, "  > 0.90      Excellent")?;
        writeln!(f, "  0.80-0.90   Very Good")?;
        writeln!(f, "  0.70-0.80   Good")?;
        writeln!(f, "  0.60-0.70   Fair")?;
        writeln!(f, "  < 0.60      Poor")?;
        writeln!(f)?;
        writeln!(
            f,
            "{} of {} artifacts present",
            self.present_count(),
            self.artifacts.len()
        )
    }
}

fn fmt_artifact(f: &mut fmt::Formatter<'_>, entry: &ArtifactEntry) -> fmt::Result {
    match &entry.status {
        ArtifactStatus::Present {
            width,
            height,
            size_kb,
        } => writeln!(
            f,
            "  ✓ {:<34} {:>5}x{:<5} {:>8.1} KB  {}",
            entry.file_name, width, height, size_kb, entry.description
        ),
        ArtifactStatus::Missing => writeln!(f, "  ✗ {:<34} not found", entry.file_name),
        ArtifactStatus::Unreadable { message } => {
            writeln!(f, "  ✗ {:<34} {}", entry.file_name, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::inspect_run;

    #[test]
    fn display_lists_missing_artifacts() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let report = inspect_run(temp.path()).expect("inspect");
        let output = report.to_string();

        assert!(output.contains("Performance Curves:"));
        assert!(output.contains("✗ F1_curve.png"));
        assert!(output.contains("results.csv not found"));
        assert!(output.contains("0 of 8 artifacts present"));
    }
}
