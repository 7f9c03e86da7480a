//! YOLO label handling.
//!
//! Parsing of per-image annotation lines into [`DetectionRecord`]s, conversion
//! to pixel-space [`PixelBox`]es, and discovery of prediction directories.

pub mod corpus;
mod geometry;
mod record;

pub use corpus::{LabeledImage, PredictionLayout};
pub use geometry::PixelBox;
pub use record::{leading_class_id, parse_label_line, parse_label_text, DetectionRecord};
