//! Font loading for class tags and captions.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::error::SignscopeError;

/// Pixel height of class tag text.
pub const LABEL_SCALE: f32 = 20.0;

/// Bold sans-serif fonts commonly installed on Linux and macOS.
const SYSTEM_FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
];

/// The font used to draw text onto images.
///
/// When no font could be loaded, text measurement falls back to a fixed
/// per-character estimate and text drawing is a no-op, so tags and captions
/// keep their layout without glyphs.
pub struct LabelFont {
    font: Option<FontVec>,
    source: Option<PathBuf>,
}

impl LabelFont {
    /// Load a font for rendering.
    ///
    /// An explicit `path` must load. Without one, the system candidates are
    /// tried in order and a missing font only produces a warning.
    pub fn load(path: Option<&Path>) -> Result<Self, SignscopeError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        for candidate in SYSTEM_FONT_CANDIDATES {
            let candidate = Path::new(candidate);
            if !candidate.is_file() {
                continue;
            }
            match Self::from_file(candidate) {
                Ok(font) => return Ok(font),
                Err(err) => tracing::debug!(error = %err, "skipping font candidate"),
            }
        }

        tracing::warn!("no usable system font found; class tags will be drawn without text");
        Ok(Self::fallback())
    }

    pub fn from_file(path: &Path) -> Result<Self, SignscopeError> {
        let data = fs::read(path).map_err(|source| SignscopeError::FontLoad {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;
        let font = FontVec::try_from_vec(data).map_err(|source| SignscopeError::FontLoad {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

        tracing::debug!(font = %path.display(), "loaded font");
        Ok(Self {
            font: Some(font),
            source: Some(path.to_path_buf()),
        })
    }

    /// A font that measures text but draws nothing.
    pub fn fallback() -> Self {
        Self {
            font: None,
            source: None,
        }
    }

    pub fn has_glyphs(&self) -> bool {
        self.font.is_some()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Width and height of `text` at `scale` pixels.
    pub fn measure(&self, text: &str, scale: f32) -> (u32, u32) {
        match &self.font {
            Some(font) => text_size(PxScale::from(scale), font, text),
            None => {
                let chars = text.chars().count() as f32;
                ((chars * scale * 0.55).ceil() as u32, scale.ceil() as u32)
            }
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`, clipped to the canvas.
    pub fn draw(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, scale: f32, text: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(canvas, color, x, y, PxScale::from(scale), font, text);
        }
    }
}
