use std::path::PathBuf;
use thiserror::Error;

/// The main error type for signscope operations.
#[derive(Debug, Error)]
pub enum SignscopeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read label file {}: {source}", path.display())]
    LabelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid layout at {}: {message}", path.display())]
    LayoutInvalid { path: PathBuf, message: String },

    #[error("Failed to decode image {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write image {}: {source}", path.display())]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read image dimensions from {}: {source}", path.display())]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to parse class style table {}: {source}", path.display())]
    StyleTableParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse YAML config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read training results {}: {source}", path.display())]
    ResultsCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("No result rows in {}", path.display())]
    ResultsEmpty { path: PathBuf },

    #[error("Failed to load font {}: {message}", path.display())]
    FontLoad { path: PathBuf, message: String },

    #[error("Invalid dataset at {}: {message}", path.display())]
    DatasetInvalid { path: PathBuf, message: String },

    #[error("Training failed: {message}")]
    TrainingFailed { message: String },

    #[error("{failed} of {total} step(s) failed")]
    StepsFailed { failed: usize, total: usize },

    #[error("Failed to write JSON output: {0}")]
    JsonOutput(#[from] serde_json::Error),

    #[error("Automatic download failed from all sources ({} attempt(s))", attempts.len())]
    DownloadFailed { attempts: Vec<String> },
}
