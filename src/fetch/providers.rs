//! Command-line based dataset providers.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use super::command::{run_tool, tool_missing, ToolFailure};
use super::{DatasetProvider, FetchError, FetchRequest};

pub const KAGGLE_DATASETS: [&str; 3] = [
    "fahadmehfoooz/brssd",
    "bangladesh-road-sign-dataset/brssd",
    "brssd/bangladeshi-road-signs",
];

pub const GITHUB_REPOSITORIES: [&str; 2] = [
    "https://github.com/fahadmehfoooz/BRSSD",
    "https://github.com/BRSSD/dataset",
];

/// Downloads through `kaggle datasets download`.
#[derive(Clone, Debug)]
pub struct KaggleCli {
    program: OsString,
    datasets: Vec<String>,
}

impl Default for KaggleCli {
    fn default() -> Self {
        Self::new("kaggle")
    }
}

impl KaggleCli {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            datasets: KAGGLE_DATASETS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DatasetProvider for KaggleCli {
    fn name(&self) -> &str {
        "kaggle"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PathBuf, FetchError> {
        let output = request.output_dir.as_os_str();
        let mut reasons = Vec::new();

        for dataset in &self.datasets {
            tracing::info!(dataset = %dataset, "trying Kaggle dataset");
            let args: [&OsStr; 7] = [
                OsStr::new("datasets"),
                OsStr::new("download"),
                OsStr::new("-d"),
                OsStr::new(dataset),
                OsStr::new("-p"),
                output,
                OsStr::new("--unzip"),
            ];
            match run_tool(&self.program, args) {
                Ok(()) => return Ok(request.output_dir.clone()),
                Err(ToolFailure::Missing) => return Err(tool_missing(&self.program)),
                Err(ToolFailure::Failed(reason)) => reasons.push(format!("{dataset}: {reason}")),
            }
        }

        Err(FetchError::CandidatesFailed(reasons))
    }
}

/// Clones the dataset with `git clone`.
#[derive(Clone, Debug)]
pub struct GitClone {
    program: OsString,
    repositories: Vec<String>,
}

impl Default for GitClone {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitClone {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            repositories: GITHUB_REPOSITORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DatasetProvider for GitClone {
    fn name(&self) -> &str {
        "github"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PathBuf, FetchError> {
        let mut reasons = Vec::new();

        for repository in &self.repositories {
            tracing::info!(repository = %repository, "trying git clone");
            let args: [&OsStr; 3] = [
                OsStr::new("clone"),
                OsStr::new(repository),
                request.output_dir.as_os_str(),
            ];
            match run_tool(&self.program, args) {
                Ok(()) => return Ok(request.output_dir.clone()),
                Err(ToolFailure::Missing) => return Err(tool_missing(&self.program)),
                Err(ToolFailure::Failed(reason)) => {
                    reasons.push(format!("{repository}: {reason}"))
                }
            }
        }

        Err(FetchError::CandidatesFailed(reasons))
    }
}
