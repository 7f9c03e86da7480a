//! Fuzz target for YOLO label parsing.
//!
//! Feeds arbitrary UTF-8 text to the line and file parsers and to the
//! pixel-box conversion, checking for panics or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use signscope::labels::{parse_label_line, parse_label_text};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Some(record) = parse_label_line(text) {
        let _ = record.to_pixel_box(640, 480).ordered();
    }
    let _ = parse_label_text(text);
});
