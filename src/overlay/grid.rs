//! Composition of annotated images into captioned grids.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use super::font::LabelFont;

/// Size of one grid cell's image area.
pub const CELL_WIDTH: u32 = 480;
pub const CELL_HEIGHT: u32 = 360;

const CAPTION_HEIGHT: u32 = 28;
const CAPTION_SCALE: f32 = 16.0;
const TITLE_HEIGHT: u32 = 48;
const TITLE_SCALE: f32 = 28.0;
const MARGIN: u32 = 8;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Rows and columns of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: u32,
    pub cols: u32,
}

impl GridLayout {
    /// Near-square layout: `floor(sqrt(n))` rows and enough columns for `n`.
    pub fn square(n: usize) -> Self {
        if n == 0 {
            return Self { rows: 0, cols: 0 };
        }
        let rows = n.isqrt().max(1);
        Self::with_rows(n, rows)
    }

    /// Two rows (one when `n < 2`) with enough columns for `n`.
    pub fn two_rows(n: usize) -> Self {
        if n == 0 {
            return Self { rows: 0, cols: 0 };
        }
        Self::with_rows(n, n.min(2))
    }

    fn with_rows(n: usize, rows: usize) -> Self {
        Self {
            rows: rows as u32,
            cols: n.div_ceil(rows) as u32,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

/// One cell of a grid.
pub struct GridTile {
    pub image: RgbImage,
    pub caption: String,
}

/// Lay tiles out row by row on a white canvas.
///
/// Each image is scaled to fit its cell without changing aspect ratio and
/// centered, with its caption underneath. Tiles beyond the layout's
/// capacity are dropped.
pub fn compose_grid(
    tiles: &[GridTile],
    layout: GridLayout,
    title: Option<&str>,
    font: &LabelFont,
) -> RgbImage {
    let slot_w = CELL_WIDTH + 2 * MARGIN;
    let slot_h = CELL_HEIGHT + CAPTION_HEIGHT + 2 * MARGIN;
    let title_h = if title.is_some() { TITLE_HEIGHT } else { 0 };

    let canvas_w = (slot_w * layout.cols).max(1);
    let canvas_h = (title_h + slot_h * layout.rows).max(1);
    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, BACKGROUND);

    if let Some(title) = title {
        let (text_w, text_h) = font.measure(title, TITLE_SCALE);
        let x = (canvas_w.saturating_sub(text_w) / 2) as i32;
        let y = (TITLE_HEIGHT.saturating_sub(text_h) / 2) as i32;
        font.draw(&mut canvas, TEXT_COLOR, x, y, TITLE_SCALE, title);
    }

    for (idx, tile) in tiles.iter().take(layout.capacity()).enumerate() {
        let row = idx as u32 / layout.cols;
        let col = idx as u32 % layout.cols;
        let slot_x = col * slot_w + MARGIN;
        let slot_y = title_h + row * slot_h + MARGIN;

        let fitted = fit_to_cell(&tile.image);
        let offset_x = slot_x + (CELL_WIDTH - fitted.width()) / 2;
        let offset_y = slot_y + (CELL_HEIGHT - fitted.height()) / 2;
        imageops::overlay(&mut canvas, &fitted, offset_x as i64, offset_y as i64);

        let (text_w, text_h) = font.measure(&tile.caption, CAPTION_SCALE);
        let caption_x = slot_x + CELL_WIDTH.saturating_sub(text_w) / 2;
        let caption_y = slot_y + CELL_HEIGHT + CAPTION_HEIGHT.saturating_sub(text_h) / 2;
        font.draw(
            &mut canvas,
            TEXT_COLOR,
            caption_x as i32,
            caption_y as i32,
            CAPTION_SCALE,
            &tile.caption,
        );
    }

    canvas
}

fn fit_to_cell(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return RgbImage::from_pixel(1, 1, BACKGROUND);
    }

    let scale = f64::min(
        CELL_WIDTH as f64 / width as f64,
        CELL_HEIGHT as f64 / height as f64,
    );
    let target_w = ((width as f64 * scale).round() as u32).clamp(1, CELL_WIDTH);
    let target_h = ((height as f64 * scale).round() as u32).clamp(1, CELL_HEIGHT);

    if (target_w, target_h) == (width, height) {
        image.clone()
    } else {
        imageops::resize(image, target_w, target_h, FilterType::Triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_layout_matches_row_column_rule() {
        assert_eq!(GridLayout::square(9), GridLayout { rows: 3, cols: 3 });
        assert_eq!(GridLayout::square(8), GridLayout { rows: 2, cols: 4 });
        assert_eq!(GridLayout::square(5), GridLayout { rows: 2, cols: 3 });
        assert_eq!(GridLayout::square(1), GridLayout { rows: 1, cols: 1 });
        assert_eq!(GridLayout::square(0).capacity(), 0);
    }

    #[test]
    fn two_row_layout() {
        assert_eq!(GridLayout::two_rows(6), GridLayout { rows: 2, cols: 3 });
        assert_eq!(GridLayout::two_rows(5), GridLayout { rows: 2, cols: 3 });
        assert_eq!(GridLayout::two_rows(1), GridLayout { rows: 1, cols: 1 });
    }

    #[test]
    fn square_rows_floor_the_square_root() {
        assert_eq!(GridLayout::square(15), GridLayout { rows: 3, cols: 5 });
        assert_eq!(GridLayout::square(16), GridLayout { rows: 4, cols: 4 });
        assert_eq!(GridLayout::square(17), GridLayout { rows: 4, cols: 5 });
    }

    #[test]
    fn canvas_size_follows_layout() {
        let font = LabelFont::fallback();
        let tiles: Vec<GridTile> = (0..3)
            .map(|i| GridTile {
                image: RgbImage::from_pixel(64, 32, Rgb([i * 40, 0, 0])),
                caption: format!("img{i}.jpg"),
            })
            .collect();

        let grid = compose_grid(&tiles, GridLayout::square(3), None, &font);
        let slot_w = CELL_WIDTH + 2 * MARGIN;
        let slot_h = CELL_HEIGHT + CAPTION_HEIGHT + 2 * MARGIN;
        assert_eq!(grid.dimensions(), (slot_w * 3, slot_h));

        let titled = compose_grid(&tiles, GridLayout::two_rows(3), Some("Title"), &font);
        assert_eq!(titled.dimensions(), (slot_w * 2, TITLE_HEIGHT + slot_h * 2));
    }

    #[test]
    fn tiles_are_scaled_into_cells() {
        let font = LabelFont::fallback();
        let tiles = vec![GridTile {
            image: RgbImage::from_pixel(960, 720, Rgb([10, 200, 10])),
            caption: String::new(),
        }];

        let grid = compose_grid(&tiles, GridLayout::square(1), None, &font);
        let center = grid.get_pixel(MARGIN + CELL_WIDTH / 2, MARGIN + CELL_HEIGHT / 2);
        assert_eq!(*center, Rgb([10, 200, 10]));
        assert_eq!(*grid.get_pixel(0, 0), BACKGROUND);
    }
}
