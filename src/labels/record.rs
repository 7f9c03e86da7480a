//! YOLO label line parsing.

use std::fmt;

use serde::Serialize;

/// One detection parsed from a YOLO label line.
///
/// Geometry is normalized to the image size: `cx`/`cy` are the box center and
/// `w`/`h` the box extents, all expressed as fractions of width/height.
/// Values outside `[0, 1]` are kept as-is; nothing here validates ranges.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DetectionRecord {
    pub class_id: u32,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl DetectionRecord {
    pub fn new(class_id: u32, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            class_id,
            cx,
            cy,
            w,
            h,
        }
    }
}

impl fmt::Display for DetectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id, self.cx, self.cy, self.w, self.h
        )
    }
}

/// Parse one annotation line.
///
/// Returns `None` for anything that is not a detection row: blank lines,
/// comments, rows with fewer than five tokens, a class id that is not a
/// non-negative integer, or geometry that is not numeric. Tokens after the
/// fifth are ignored.
pub fn parse_label_line(line: &str) -> Option<DetectionRecord> {
    let mut tokens = line.split_whitespace();

    let class_id = tokens.next()?.parse::<u32>().ok()?;
    let cx = tokens.next()?.parse::<f64>().ok()?;
    let cy = tokens.next()?.parse::<f64>().ok()?;
    let w = tokens.next()?.parse::<f64>().ok()?;
    let h = tokens.next()?.parse::<f64>().ok()?;

    Some(DetectionRecord {
        class_id,
        cx,
        cy,
        w,
        h,
    })
}

/// Parse every valid line of a label file, keeping 1-based line numbers.
pub fn parse_label_text(text: &str) -> Vec<(usize, DetectionRecord)> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let parsed = parse_label_line(line);
            if parsed.is_none() && !line.trim().is_empty() {
                tracing::trace!(line = idx + 1, content = line, "skipping malformed label line");
            }
            parsed.map(|record| (idx + 1, record))
        })
        .collect()
}

/// Class id of a line, looking only at the first token.
///
/// Used for class-range checks where the geometry is irrelevant.
pub fn leading_class_id(line: &str) -> Option<u32> {
    line.split_whitespace().next()?.parse::<u32>().ok()
}
