//! Normalized-to-pixel box conversion.

use serde::Serialize;

use super::record::DetectionRecord;

/// An integer box in image space (x1, y1) top-left, (x2, y2) bottom-right.
///
/// Boxes are neither clamped to the image nor guaranteed to be ordered: a
/// detection hanging off the left edge yields a negative `x1`, and malformed
/// input can produce `x2 < x1`. Drawing code clips instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PixelBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelBox {
    /// Returns the box with corners swapped as needed so that min <= max.
    pub fn ordered(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    /// Inclusive width in pixels of the ordered box.
    pub fn width(&self) -> u32 {
        self.x1.abs_diff(self.x2).saturating_add(1)
    }

    /// Inclusive height in pixels of the ordered box.
    pub fn height(&self) -> u32 {
        self.y1.abs_diff(self.y2).saturating_add(1)
    }
}

impl DetectionRecord {
    /// Map the normalized box onto an image of `width` x `height` pixels.
    ///
    /// Each edge is computed from the half-extent formula and truncated
    /// toward zero.
    pub fn to_pixel_box(&self, width: u32, height: u32) -> PixelBox {
        let w = width as f64;
        let h = height as f64;
        PixelBox {
            x1: ((self.cx - self.w / 2.0) * w) as i32,
            y1: ((self.cy - self.h / 2.0) * h) as i32,
            x2: ((self.cx + self.w / 2.0) * w) as i32,
            y2: ((self.cy + self.h / 2.0) * h) as i32,
        }
    }
}
