//! Dataset descriptor (`data.yaml`) loading and layout checks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::SignscopeError;

/// Directories a training dataset must contain, relative to its root.
pub const REQUIRED_DIRS: [&str; 4] = [
    "train/images",
    "train/labels",
    "valid/images",
    "valid/labels",
];

#[derive(Debug, Deserialize)]
struct DataYaml {
    path: Option<PathBuf>,
    nc: Option<usize>,
    #[serde(default)]
    names: Option<DataYamlNames>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

impl DataYamlNames {
    fn into_vec(self) -> Vec<String> {
        match self {
            DataYamlNames::Sequence(names) => names,
            DataYamlNames::Mapping(mapping) => {
                let Some(max_index) = mapping.keys().max().copied() else {
                    return Vec::new();
                };
                let mut names = vec![String::new(); max_index + 1];
                for (index, name) in mapping {
                    names[index] = name;
                }
                names
            }
        }
    }
}

/// A dataset descriptor resolved against the filesystem.
#[derive(Clone, Debug, Serialize)]
pub struct DatasetDescriptor {
    /// The `data.yaml` file itself.
    pub descriptor: PathBuf,
    /// Dataset root; a relative `path` is resolved against the descriptor's
    /// directory, and a missing one means the descriptor's directory.
    pub root: PathBuf,
    pub class_count: Option<usize>,
    pub class_names: Vec<String>,
}

impl DatasetDescriptor {
    pub fn load(descriptor: &Path) -> Result<Self, SignscopeError> {
        if !descriptor.is_file() {
            return Err(SignscopeError::FileNotFound {
                path: descriptor.to_path_buf(),
            });
        }

        let data = fs::read_to_string(descriptor).map_err(SignscopeError::Io)?;
        let parsed: DataYaml =
            serde_yaml::from_str(&data).map_err(|source| SignscopeError::ConfigParse {
                path: descriptor.to_path_buf(),
                source,
            })?;

        let base = descriptor
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let root = match parsed.path {
            Some(path) if path.is_absolute() => path,
            Some(path) => base.join(path),
            None => base.to_path_buf(),
        };

        let class_names = parsed.names.map(DataYamlNames::into_vec).unwrap_or_default();
        let class_count = parsed
            .nc
            .or_else(|| (!class_names.is_empty()).then_some(class_names.len()));

        Ok(Self {
            descriptor: descriptor.to_path_buf(),
            root,
            class_count,
            class_names,
        })
    }
}

/// Image counts of a verified dataset.
#[derive(Clone, Debug, Serialize)]
pub struct DatasetSummary {
    pub dataset: DatasetDescriptor,
    pub train_images: usize,
    pub valid_images: usize,
    /// `None` when the dataset has no `test/images` directory.
    pub test_images: Option<usize>,
}

/// Load a descriptor and check that the training layout is present.
pub fn verify_dataset(descriptor: &Path) -> Result<DatasetSummary, SignscopeError> {
    let dataset = DatasetDescriptor::load(descriptor)?;

    let missing: Vec<&str> = REQUIRED_DIRS
        .iter()
        .copied()
        .filter(|dir| !dataset.root.join(dir).is_dir())
        .collect();
    if !missing.is_empty() {
        return Err(SignscopeError::DatasetInvalid {
            path: dataset.root.clone(),
            message: format!("missing required directories: {}", missing.join(", ")),
        });
    }

    let train_images = count_files(&dataset.root.join("train/images"));
    let valid_images = count_files(&dataset.root.join("valid/images"));
    let test_dir = dataset.root.join("test/images");
    let test_images = test_dir.is_dir().then(|| count_files(&test_dir));

    tracing::debug!(
        root = %dataset.root.display(),
        train_images,
        valid_images,
        "verified dataset layout"
    );

    Ok(DatasetSummary {
        dataset,
        train_images,
        valid_images,
        test_images,
    })
}

fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count()
}
