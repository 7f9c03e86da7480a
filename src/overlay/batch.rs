//! Batch visualization over a prediction directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::font::LabelFont;
use super::grid::{compose_grid, GridLayout, GridTile};
use super::renderer::{save_rgb, OverlayRenderer};
use crate::error::SignscopeError;
use crate::labels::{LabeledImage, PredictionLayout};
use crate::style::StyleTable;

pub const GRID_FILE_NAME: &str = "predictions_grid.png";

/// An image file written by a batch operation.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedOutput {
    pub path: PathBuf,
    /// Number of annotated images that went into it.
    pub images: usize,
}

/// Outcome of rendering every labeled image individually.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IndividualOutcome {
    pub output_dir: PathBuf,
    pub written: Vec<PathBuf>,
    /// Source image and error message for each image that failed.
    pub failed: Vec<(PathBuf, String)>,
}

/// Shared state for the batch renderers.
pub struct Visualizer<'a> {
    layout: &'a PredictionLayout,
    styles: &'a StyleTable,
    font: &'a LabelFont,
}

impl<'a> Visualizer<'a> {
    pub fn new(layout: &'a PredictionLayout, styles: &'a StyleTable, font: &'a LabelFont) -> Self {
        Self {
            layout,
            styles,
            font,
        }
    }

    fn renderer(&self) -> OverlayRenderer<'a> {
        OverlayRenderer::new(self.styles, self.font)
    }

    /// Render the first `max_images` labeled images into a near-square grid
    /// written to `<output_dir>/predictions_grid.png`.
    ///
    /// Returns `None` when there is nothing to draw.
    pub fn render_grid(
        &self,
        max_images: usize,
        output_dir: &Path,
    ) -> Result<Option<RenderedOutput>, SignscopeError> {
        let mut pairs = self.layout.labeled_images()?;
        pairs.truncate(max_images);

        let tiles = self.annotate_tiles(&pairs);
        if tiles.is_empty() {
            tracing::warn!(labels = %self.layout.labels_dir.display(), "no labeled images to draw");
            return Ok(None);
        }

        let grid = compose_grid(&tiles, GridLayout::square(tiles.len()), None, self.font);
        let path = output_dir.join(GRID_FILE_NAME);
        write_image(&grid, &path)?;

        Ok(Some(RenderedOutput {
            path,
            images: tiles.len(),
        }))
    }

    /// Render up to `max_images` images containing `class_id` into a
    /// two-row grid titled with the class name.
    pub fn render_class(
        &self,
        class_id: u32,
        max_images: usize,
        output_dir: &Path,
    ) -> Result<Option<RenderedOutput>, SignscopeError> {
        let mut pairs = self.layout.images_with_class(class_id)?;
        pairs.truncate(max_images);

        let tiles = self.annotate_tiles(&pairs);
        if tiles.is_empty() {
            tracing::warn!(class_id, "no images found with this class");
            return Ok(None);
        }

        let name = self.styles.name(class_id);
        let title = format!("Traffic Sign Class: {name} (ID: {class_id})");
        let grid = compose_grid(
            &tiles,
            GridLayout::two_rows(tiles.len()),
            Some(&title),
            self.font,
        );
        let path = output_dir.join(class_file_name(class_id, &name));
        write_image(&grid, &path)?;

        Ok(Some(RenderedOutput {
            path,
            images: tiles.len(),
        }))
    }

    /// Write one annotated copy of every labeled image into `output_dir`,
    /// keeping the source file name. Failures are collected, not fatal.
    pub fn render_individual(&self, output_dir: &Path) -> Result<IndividualOutcome, SignscopeError> {
        fs::create_dir_all(output_dir).map_err(SignscopeError::Io)?;
        let renderer = self.renderer();

        let mut outcome = IndividualOutcome {
            output_dir: output_dir.to_path_buf(),
            ..IndividualOutcome::default()
        };

        for pair in self.layout.labeled_images()? {
            let Some(file_name) = pair.image_path.file_name() else {
                continue;
            };
            let target = output_dir.join(file_name);

            let result = renderer
                .annotate_file(&pair.image_path, &pair.label_path)
                .and_then(|annotated| save_rgb(&annotated, &target));

            match result {
                Ok(()) => outcome.written.push(target),
                Err(err) => {
                    tracing::warn!(image = %pair.image_path.display(), error = %err, "failed to annotate image");
                    outcome.failed.push((pair.image_path, err.to_string()));
                }
            }
        }

        Ok(outcome)
    }

    fn annotate_tiles(&self, pairs: &[LabeledImage]) -> Vec<GridTile> {
        let renderer = self.renderer();
        let mut tiles = Vec::with_capacity(pairs.len());

        for pair in pairs {
            match renderer.annotate_file(&pair.image_path, &pair.label_path) {
                Ok(image) => tiles.push(GridTile {
                    image,
                    caption: pair
                        .image_path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                }),
                Err(err) => {
                    tracing::warn!(image = %pair.image_path.display(), error = %err, "skipping image")
                }
            }
        }

        tiles
    }
}

/// `class_{id}_{name}.png` with path separators in the name replaced.
pub fn class_file_name(class_id: u32, name: &str) -> String {
    format!("class_{}_{}.png", class_id, name.replace('/', "_"))
}

fn write_image(image: &image::RgbImage, path: &Path) -> Result<(), SignscopeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(SignscopeError::Io)?;
    }
    save_rgb(image, path)?;
    tracing::debug!(output = %path.display(), "wrote image");
    Ok(())
}
