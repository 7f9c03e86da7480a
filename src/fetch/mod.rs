//! Dataset download with provider fallback.
//!
//! Providers are tried in order until one succeeds. Every failure reason is
//! kept so that a total failure can report what was attempted.

mod command;
mod providers;
mod roboflow;

pub use providers::{GitClone, KaggleCli, GITHUB_REPOSITORIES, KAGGLE_DATASETS};
pub use roboflow::{Roboflow, RoboflowProject};

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::error::SignscopeError;

/// Where to put the dataset and which credentials to use.
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub output_dir: PathBuf,
    pub roboflow_api_key: Option<String>,
}

/// Why a single provider did not produce a dataset.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider cannot run at all (missing tool, key or feature).
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Every candidate the provider knows about failed.
    #[error("{}", .0.join("; "))]
    CandidatesFailed(Vec<String>),
}

/// A source the dataset can be fetched from.
pub trait DatasetProvider {
    fn name(&self) -> &str;

    /// Fetch into `request.output_dir`, returning the dataset location.
    fn fetch(&self, request: &FetchRequest) -> Result<PathBuf, FetchError>;
}

/// Which providers to try.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DatasetSource {
    Roboflow,
    Kaggle,
    Github,
    /// Roboflow, then Kaggle, then GitHub.
    #[default]
    All,
}

/// The providers for `source`, in fallback order.
pub fn providers_for(source: DatasetSource) -> Vec<Box<dyn DatasetProvider>> {
    match source {
        DatasetSource::Roboflow => vec![Box::new(Roboflow::default())],
        DatasetSource::Kaggle => vec![Box::new(KaggleCli::default())],
        DatasetSource::Github => vec![Box::new(GitClone::default())],
        DatasetSource::All => vec![
            Box::new(Roboflow::default()),
            Box::new(KaggleCli::default()),
            Box::new(GitClone::default()),
        ],
    }
}

/// A successful download.
#[derive(Clone, Debug, Serialize)]
pub struct DownloadOutcome {
    pub provider: String,
    pub location: PathBuf,
    /// Failures of the providers tried before this one.
    pub earlier_failures: Vec<String>,
}

/// Try `providers` in order and stop at the first success.
pub fn download_dataset(
    providers: &[Box<dyn DatasetProvider>],
    request: &FetchRequest,
) -> Result<DownloadOutcome, SignscopeError> {
    let mut attempts = Vec::new();
    let total = providers.len();

    for (idx, provider) in providers.iter().enumerate() {
        tracing::info!(
            provider = provider.name(),
            step = idx + 1,
            total,
            "trying dataset provider"
        );

        match provider.fetch(request) {
            Ok(location) => {
                return Ok(DownloadOutcome {
                    provider: provider.name().to_string(),
                    location,
                    earlier_failures: attempts,
                });
            }
            Err(err) => {
                tracing::warn!(provider = provider.name(), error = %err, "provider failed");
                attempts.push(format!("{}: {}", provider.name(), err));
            }
        }
    }

    Err(SignscopeError::DownloadFailed { attempts })
}

/// Instructions for getting the dataset by hand.
pub fn manual_instructions(output_dir: &Path) -> String {
    let out = output_dir.display();
    format!(
        "MANUAL DOWNLOAD INSTRUCTIONS

BRSSD dataset sources:

1. Roboflow Universe:
   - Visit: https://universe.roboflow.com/
   - Search for 'BRSSD' or 'Bangladesh Road Signs'
   - Download in YOLOv8 format
   - Extract to: {out}/

2. Kaggle:
   - Visit: https://www.kaggle.com/datasets
   - Search for 'BRSSD' or 'Bangladesh traffic signs'
   - Download and extract to: {out}/

3. Research paper / official source:
   - Search for 'BRSSD dataset paper'
   - Contact the authors for dataset access

4. GitHub:
   - Search: github.com/search?q=BRSSD

Expected directory structure:
  {out}/
  ├── train/
  │   ├── images/
  │   └── labels/
  ├── valid/
  │   ├── images/
  │   └── labels/
  └── test/
      ├── images/
      └── labels/
"
    )
}
