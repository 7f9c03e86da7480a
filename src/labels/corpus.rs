//! Prediction directory discovery.
//!
//! A prediction run lays images out flat in one directory with a `labels/`
//! subdirectory holding one `.txt` file per image that received detections:
//!
//! ```text
//! predict/
//! ├── 0001.jpg
//! ├── 0002.jpg
//! └── labels/
//!     └── 0001.txt
//! ```

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::record::{parse_label_text, DetectionRecord};
use crate::error::SignscopeError;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "png", "jpeg", "bmp", "webp"];
pub const LABEL_EXTENSION: &str = "txt";

/// Images directory plus the labels directory that annotates it.
#[derive(Clone, Debug)]
pub struct PredictionLayout {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

/// A label file together with the image it annotates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledImage {
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

impl PredictionLayout {
    /// Build a layout rooted at a prediction directory.
    ///
    /// `labels_dir` defaults to `<images_dir>/labels`. Only `images_dir` has to
    /// exist; a missing labels directory is reported by the operations that
    /// need it.
    pub fn discover(
        images_dir: &Path,
        labels_dir: Option<&Path>,
    ) -> Result<PredictionLayout, SignscopeError> {
        if !images_dir.is_dir() {
            return Err(SignscopeError::DirectoryNotFound {
                path: images_dir.to_path_buf(),
            });
        }

        let labels_dir = labels_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| images_dir.join("labels"));

        Ok(PredictionLayout {
            images_dir: images_dir.to_path_buf(),
            labels_dir,
        })
    }

    /// All images directly inside the images directory, sorted by name.
    pub fn image_files(&self) -> Result<Vec<PathBuf>, SignscopeError> {
        let mut files = collect_files_with_extensions(&self.images_dir, &IMAGE_EXTENSIONS)?;
        files.sort();
        Ok(files)
    }

    /// All label files, sorted by name.
    pub fn label_files(&self) -> Result<Vec<PathBuf>, SignscopeError> {
        label_files_in(&self.labels_dir)
    }

    /// Locate the image a label file annotates, trying extensions in order.
    pub fn image_for_label(&self, label_path: &Path) -> Option<PathBuf> {
        let stem = label_path.file_stem()?;
        for ext in IMAGE_EXTENSIONS {
            let candidate = self.images_dir.join(with_suffix(stem, ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Label path an image would have, whether or not it exists.
    pub fn label_for_image(&self, image_path: &Path) -> PathBuf {
        let stem = image_path.file_stem().unwrap_or(image_path.as_os_str());
        self.labels_dir.join(with_suffix(stem, LABEL_EXTENSION))
    }

    /// Label files whose image exists, in label-name order.
    pub fn labeled_images(&self) -> Result<Vec<LabeledImage>, SignscopeError> {
        let mut pairs = Vec::new();
        for label_path in self.label_files()? {
            match self.image_for_label(&label_path) {
                Some(image_path) => pairs.push(LabeledImage {
                    image_path,
                    label_path,
                }),
                None => tracing::debug!(
                    label = %label_path.display(),
                    "no image found for label file"
                ),
            }
        }
        Ok(pairs)
    }

    /// Labeled images with at least one detection of `class_id`.
    pub fn images_with_class(&self, class_id: u32) -> Result<Vec<LabeledImage>, SignscopeError> {
        let mut matches = Vec::new();
        for pair in self.labeled_images()? {
            let records = read_label_file(&pair.label_path)?;
            if records.iter().any(|record| record.class_id == class_id) {
                matches.push(pair);
            }
        }
        Ok(matches)
    }
}

/// Sorted label files directly inside `labels_dir`.
pub fn label_files_in(labels_dir: &Path) -> Result<Vec<PathBuf>, SignscopeError> {
    if !labels_dir.is_dir() {
        return Err(SignscopeError::DirectoryNotFound {
            path: labels_dir.to_path_buf(),
        });
    }
    let mut files = collect_files_with_extensions(labels_dir, &[LABEL_EXTENSION])?;
    files.sort();
    Ok(files)
}

/// Read a label file as text.
///
/// Invalid UTF-8 is replaced rather than rejected, so a corrupt byte only
/// spoils the line it sits on and the parser skips that line.
pub fn read_label_text(path: &Path) -> Result<String, SignscopeError> {
    let bytes = fs::read(path).map_err(|source| SignscopeError::LabelRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read the valid detection records of one label file.
pub fn read_label_file(path: &Path) -> Result<Vec<DetectionRecord>, SignscopeError> {
    let content = read_label_text(path)?;
    Ok(parse_label_text(&content)
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}

/// Read a label file if it exists; a missing file yields no records.
pub fn read_optional_label_file(path: &Path) -> Result<Vec<DetectionRecord>, SignscopeError> {
    if path.is_file() {
        read_label_file(path)
    } else {
        Ok(Vec::new())
    }
}

fn collect_files_with_extensions(
    root: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, SignscopeError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| SignscopeError::LayoutInvalid {
            path: root.to_path_buf(),
            message: format!("failed while listing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}

// `Path::with_extension` would clobber dotted stems like `frame.001`.
fn with_suffix(stem: &OsStr, ext: &str) -> OsString {
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(ext);
    name
}

pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_layout(root: &Path) {
        fs::create_dir_all(root.join("labels")).expect("create labels dir");
    }

    #[test]
    fn discover_requires_images_dir() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = PredictionLayout::discover(&temp.path().join("missing"), None).unwrap_err();
        assert!(matches!(err, SignscopeError::DirectoryNotFound { .. }));
    }

    #[test]
    fn discover_defaults_labels_subdir() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = PredictionLayout::discover(temp.path(), None).expect("discover");
        assert_eq!(layout.labels_dir, temp.path().join("labels"));
    }

    #[test]
    fn image_files_skip_labels_subdir_and_other_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        create_layout(temp.path());
        fs::write(temp.path().join("b.jpg"), b"x").expect("write");
        fs::write(temp.path().join("a.PNG"), b"x").expect("write");
        fs::write(temp.path().join("notes.md"), b"x").expect("write");
        fs::write(temp.path().join("labels/a.txt"), b"").expect("write");

        let layout = PredictionLayout::discover(temp.path(), None).expect("discover");
        let images = layout.image_files().expect("list images");
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.jpg"]);
    }

    #[test]
    fn label_files_report_missing_dir() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = PredictionLayout::discover(temp.path(), None).expect("discover");
        let err = layout.label_files().unwrap_err();
        assert!(matches!(err, SignscopeError::DirectoryNotFound { .. }));
    }

    #[test]
    fn image_for_label_prefers_extension_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        create_layout(temp.path());
        fs::write(temp.path().join("sample.png"), b"dummy").expect("write png");
        fs::write(temp.path().join("sample.jpg"), b"dummy").expect("write jpg");

        let layout = PredictionLayout::discover(temp.path(), None).expect("discover");
        let found = layout
            .image_for_label(&temp.path().join("labels/sample.txt"))
            .expect("should find image");
        assert!(found.ends_with("sample.jpg"));
    }

    #[test]
    fn image_for_label_keeps_dotted_stems() {
        let temp = tempfile::tempdir().expect("create temp dir");
        create_layout(temp.path());
        fs::write(temp.path().join("frame.001.jpg"), b"dummy").expect("write jpg");

        let layout = PredictionLayout::discover(temp.path(), None).expect("discover");
        let label = layout.label_for_image(&temp.path().join("frame.001.jpg"));
        assert!(label.ends_with("labels/frame.001.txt"));
        assert!(layout.image_for_label(&label).is_some());
    }

    #[test]
    fn labeled_images_drop_orphan_labels() {
        let temp = tempfile::tempdir().expect("create temp dir");
        create_layout(temp.path());
        fs::write(temp.path().join("a.jpg"), b"x").expect("write");
        fs::write(temp.path().join("labels/a.txt"), "1 0.5 0.5 0.1 0.1\n").expect("write");
        fs::write(temp.path().join("labels/orphan.txt"), "1 0.5 0.5 0.1 0.1\n").expect("write");

        let layout = PredictionLayout::discover(temp.path(), None).expect("discover");
        let pairs = layout.labeled_images().expect("pairs");
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].image_path.ends_with("a.jpg"));
    }

    #[test]
    fn images_with_class_filters_on_any_detection() {
        let temp = tempfile::tempdir().expect("create temp dir");
        create_layout(temp.path());
        for name in ["a", "b", "c"] {
            fs::write(temp.path().join(format!("{name}.jpg")), b"x").expect("write");
        }
        fs::write(
            temp.path().join("labels/a.txt"),
            "3 0.5 0.5 0.1 0.1\n36 0.2 0.2 0.1 0.1\n",
        )
        .expect("write");
        fs::write(temp.path().join("labels/b.txt"), "3 0.5 0.5 0.1 0.1\n").expect("write");
        fs::write(temp.path().join("labels/c.txt"), "36 0.5 0.5 0.1 0.1\n").expect("write");

        let layout = PredictionLayout::discover(temp.path(), None).expect("discover");
        let matches = layout.images_with_class(36).expect("filter");
        let names: Vec<_> = matches
            .iter()
            .map(|p| p.image_path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "c.jpg"]);
    }

    #[test]
    fn read_optional_label_file_tolerates_missing_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let records = read_optional_label_file(&temp.path().join("none.txt")).expect("read");
        assert!(records.is_empty());
    }
}
