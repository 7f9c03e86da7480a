//! Drawing detections onto a single image.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use super::font::{LabelFont, LABEL_SCALE};
use crate::error::SignscopeError;
use crate::labels::corpus::read_optional_label_file;
use crate::labels::{DetectionRecord, PixelBox};
use crate::style::StyleTable;

/// Outline thickness in pixels.
pub const OUTLINE_THICKNESS: i32 = 3;

/// Padding between tag edge and tag text.
const TAG_PADDING: i32 = 3;

const TAG_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Draws detection boxes and class tags using a [`StyleTable`].
pub struct OverlayRenderer<'a> {
    styles: &'a StyleTable,
    font: &'a LabelFont,
}

impl<'a> OverlayRenderer<'a> {
    pub fn new(styles: &'a StyleTable, font: &'a LabelFont) -> Self {
        Self { styles, font }
    }

    /// Return an annotated copy of `image`.
    ///
    /// With no records the copy is identical to the input.
    pub fn render(&self, image: &RgbImage, records: &[DetectionRecord]) -> RgbImage {
        let mut canvas = image.clone();
        for record in records {
            self.draw(&mut canvas, record);
        }
        canvas
    }

    /// Draw one detection in place.
    pub fn draw(&self, canvas: &mut RgbImage, record: &DetectionRecord) {
        let (width, height) = canvas.dimensions();
        let bbox = record.to_pixel_box(width, height).ordered();
        let color = Rgb(self.styles.color(record.class_id));

        draw_outline(canvas, &bbox, color);

        let name = self.styles.name(record.class_id);
        let (text_w, text_h) = self.font.measure(&name, LABEL_SCALE);
        let tag_w = text_w as i32 + 2 * TAG_PADDING;
        let tag_h = text_h as i32 + 2 * TAG_PADDING;
        let tag_x = bbox.x1;
        let tag_y = bbox.y1.saturating_sub(tag_h);

        fill_clipped(
            canvas,
            tag_x,
            tag_y,
            tag_x.saturating_add(tag_w - 1),
            tag_y.saturating_add(tag_h - 1),
            color,
        );
        self.font.draw(
            canvas,
            TAG_TEXT_COLOR,
            tag_x.saturating_add(TAG_PADDING),
            tag_y.saturating_add(TAG_PADDING),
            LABEL_SCALE,
            &name,
        );
    }

    /// Decode `image_path`, draw the detections from `label_path` (if it
    /// exists) and return the result.
    pub fn annotate_file(
        &self,
        image_path: &Path,
        label_path: &Path,
    ) -> Result<RgbImage, SignscopeError> {
        let image = load_rgb(image_path)?;
        let records = read_optional_label_file(label_path)?;
        tracing::debug!(
            image = %image_path.display(),
            detections = records.len(),
            "annotating image"
        );
        Ok(self.render(&image, &records))
    }
}

/// Decode an image file into RGB.
pub fn load_rgb(path: &Path) -> Result<RgbImage, SignscopeError> {
    image::open(path)
        .map(|image| image.to_rgb8())
        .map_err(|source| SignscopeError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })
}

/// Save an image, choosing the encoder from the file extension.
pub fn save_rgb(image: &RgbImage, path: &Path) -> Result<(), SignscopeError> {
    image.save(path).map_err(|source| SignscopeError::ImageWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn draw_outline(canvas: &mut RgbImage, bbox: &PixelBox, color: Rgb<u8>) {
    let t = OUTLINE_THICKNESS - 1;
    let PixelBox { x1, y1, x2, y2 } = *bbox;

    fill_clipped(canvas, x1, y1, x2, y1.saturating_add(t), color);
    fill_clipped(canvas, x1, y2.saturating_sub(t), x2, y2, color);
    fill_clipped(canvas, x1, y1, x1.saturating_add(t), y2, color);
    fill_clipped(canvas, x2.saturating_sub(t), y1, x2, y2, color);
}

/// Fill the inclusive rectangle `(x1, y1)..=(x2, y2)` after clipping it to
/// the canvas. Fully off-canvas rectangles draw nothing.
fn fill_clipped(canvas: &mut RgbImage, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>) {
    if let Some(rect) = clip_rect(canvas.dimensions(), x1, y1, x2, y2) {
        draw_filled_rect_mut(canvas, rect, color);
    }
}

fn clip_rect((width, height): (u32, u32), x1: i32, y1: i32, x2: i32, y2: i32) -> Option<Rect> {
    if width == 0 || height == 0 {
        return None;
    }
    let max_x = i32::try_from(width - 1).unwrap_or(i32::MAX);
    let max_y = i32::try_from(height - 1).unwrap_or(i32::MAX);

    let left = x1.min(x2).max(0);
    let top = y1.min(y2).max(0);
    let right = x1.max(x2).min(max_x);
    let bottom = y1.max(y2).min(max_y);

    if left > right || top > bottom {
        return None;
    }

    let rect_w = (right - left) as u32 + 1;
    let rect_h = (bottom - top) as u32 + 1;
    Some(Rect::at(left, top).of_size(rect_w, rect_h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ClassStyle, DEFAULT_COLOR};

    fn gray(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([90, 90, 90]))
    }

    #[test]
    fn no_records_leave_image_identical() {
        let styles = StyleTable::traffic_signs();
        let font = LabelFont::fallback();
        let renderer = OverlayRenderer::new(&styles, &font);

        let image = gray(64, 48);
        let rendered = renderer.render(&image, &[]);
        assert_eq!(rendered.as_raw(), image.as_raw());
    }

    #[test]
    fn outline_uses_class_color() {
        let mut styles = StyleTable::empty();
        styles.insert(4, ClassStyle::new("Stop", [200, 10, 10]));
        let font = LabelFont::fallback();
        let renderer = OverlayRenderer::new(&styles, &font);

        // Box spans x 25..=75, y 50..=150 on a 100x200 image.
        let record = DetectionRecord::new(4, 0.5, 0.5, 0.5, 0.5);
        let rendered = renderer.render(&gray(100, 200), &[record]);

        assert_eq!(*rendered.get_pixel(25, 100), Rgb([200, 10, 10]));
        assert_eq!(*rendered.get_pixel(27, 100), Rgb([200, 10, 10]));
        assert_eq!(*rendered.get_pixel(28, 100), Rgb([90, 90, 90]));
        assert_eq!(*rendered.get_pixel(75, 149), Rgb([200, 10, 10]));
        assert_eq!(*rendered.get_pixel(50, 100), Rgb([90, 90, 90]));
    }

    #[test]
    fn tag_sits_above_the_box() {
        let mut styles = StyleTable::empty();
        styles.insert(1, ClassStyle::new("Yield", [0, 0, 250]));
        let font = LabelFont::fallback();
        let renderer = OverlayRenderer::new(&styles, &font);

        let record = DetectionRecord::new(1, 0.5, 0.5, 0.25, 0.25);
        let rendered = renderer.render(&gray(200, 200), &[record]);

        // Box top edge is y = 75; the tag fills rows above it.
        assert_eq!(*rendered.get_pixel(80, 70), Rgb([0, 0, 250]));
        assert_eq!(*rendered.get_pixel(80, 5), Rgb([90, 90, 90]));
    }

    #[test]
    fn unknown_class_uses_default_color() {
        let styles = StyleTable::traffic_signs();
        let font = LabelFont::fallback();
        let renderer = OverlayRenderer::new(&styles, &font);

        let record = DetectionRecord::new(99, 0.5, 0.5, 0.5, 0.5);
        let rendered = renderer.render(&gray(100, 100), &[record]);

        assert_eq!(*rendered.get_pixel(25, 50), Rgb(DEFAULT_COLOR));
        assert_eq!(styles.name(99), "Class 99");
    }

    #[test]
    fn boxes_off_canvas_are_clipped() {
        let styles = StyleTable::traffic_signs();
        let font = LabelFont::fallback();
        let renderer = OverlayRenderer::new(&styles, &font);

        let records = [
            DetectionRecord::new(22, 0.0, 1.0, 0.5, 0.5),
            DetectionRecord::new(22, 5.0, 5.0, 0.1, 0.1),
            DetectionRecord::new(22, 0.5, 0.5, 1e12, 1e12),
            DetectionRecord::new(22, 0.5, 0.5, -0.2, -0.2),
        ];
        let rendered = renderer.render(&gray(40, 40), &records);
        assert_eq!(rendered.dimensions(), (40, 40));
    }

    #[test]
    fn clip_rect_rejects_off_canvas_boxes() {
        assert!(clip_rect((10, 10), 20, 20, 30, 30).is_none());
        assert!(clip_rect((10, 10), -5, -5, -1, -1).is_none());
        assert!(clip_rect((0, 10), 0, 0, 5, 5).is_none());

        let rect = clip_rect((10, 10), -5, 2, 4, 20).expect("overlaps canvas");
        assert_eq!((rect.left(), rect.top()), (0, 2));
        assert_eq!((rect.width(), rect.height()), (5, 8));
    }

    #[test]
    fn annotate_file_without_label_is_unmodified() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let image_path = temp.path().join("a.png");
        let image = gray(16, 12);
        image.save(&image_path).expect("save png");

        let styles = StyleTable::traffic_signs();
        let font = LabelFont::fallback();
        let renderer = OverlayRenderer::new(&styles, &font);
        let rendered = renderer
            .annotate_file(&image_path, &temp.path().join("labels/a.txt"))
            .expect("annotate");

        assert_eq!(rendered.as_raw(), image.as_raw());
    }

    #[test]
    fn annotate_file_reports_undecodable_image() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let image_path = temp.path().join("broken.png");
        std::fs::write(&image_path, b"not an image").expect("write");

        let styles = StyleTable::traffic_signs();
        let font = LabelFont::fallback();
        let renderer = OverlayRenderer::new(&styles, &font);
        let err = renderer
            .annotate_file(&image_path, &temp.path().join("broken.txt"))
            .unwrap_err();
        assert!(matches!(err, SignscopeError::ImageDecode { .. }));
    }
}
