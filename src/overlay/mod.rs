//! Visual overlays of detections.
//!
//! [`OverlayRenderer`] draws class-colored boxes and tags on a single image;
//! [`Visualizer`] batches it over a prediction directory into grids, per-class
//! sheets or individual annotated copies.

mod batch;
mod font;
mod grid;
mod renderer;

pub use batch::{class_file_name, IndividualOutcome, RenderedOutput, Visualizer, GRID_FILE_NAME};
pub use font::{LabelFont, LABEL_SCALE};
pub use grid::{compose_grid, GridLayout, GridTile, CELL_HEIGHT, CELL_WIDTH};
pub use renderer::{load_rgb, save_rgb, OverlayRenderer, OUTLINE_THICKNESS};
