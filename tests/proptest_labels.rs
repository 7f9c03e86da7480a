use proptest::prelude::*;
use signscope::labels::{parse_label_line, DetectionRecord};
use signscope::stats::ClassTally;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn display_then_parse_preserves_record(record in proptest_helpers::arb_record()) {
        let line = record.to_string();
        let parsed = parse_label_line(&line).expect("displayed record parses");

        prop_assert_eq!(parsed.class_id, record.class_id);
        prop_assert!((parsed.cx - record.cx).abs() < 1e-12);
        prop_assert!((parsed.cy - record.cy).abs() < 1e-12);
        prop_assert!((parsed.w - record.w).abs() < 1e-12);
        prop_assert!((parsed.h - record.h).abs() < 1e-12);
    }

    #[test]
    fn parser_never_panics(line in ".*") {
        let _ = parse_label_line(&line);
    }

    #[test]
    fn short_lines_never_parse(tokens in prop::collection::vec("[0-9]{1,3}", 0..5)) {
        let line = tokens.join(" ");
        prop_assert!(parse_label_line(&line).is_none());
    }

    #[test]
    fn class_percentages_sum_to_hundred(
        files in prop::collection::vec(proptest_helpers::arb_label_text(6), 1..6)
    ) {
        let mut tally = ClassTally::new();
        for text in &files {
            tally.add_label_text(text);
        }

        let sum: f64 = tally.class_counts.keys().map(|&id| tally.percentage(id)).sum();
        if tally.total_detections == 0 {
            prop_assert_eq!(sum, 0.0);
        } else {
            prop_assert!((sum - 100.0).abs() < 1e-6, "sum was {}", sum);
        }

        let counted: usize = tally.class_counts.values().sum();
        prop_assert_eq!(counted, tally.total_detections);
        prop_assert_eq!(tally.label_files, files.len());
    }

    #[test]
    fn pixel_box_edges_track_unrounded_values(
        record in proptest_helpers::arb_record(),
        width in 1u32..4000,
        height in 1u32..4000,
    ) {
        let bbox = record.to_pixel_box(width, height);
        let exact_x1 = (record.cx - record.w / 2.0) * width as f64;
        let exact_y2 = (record.cy + record.h / 2.0) * height as f64;

        prop_assert!(bbox.x1 <= bbox.x2);
        prop_assert!(bbox.y1 <= bbox.y2);
        prop_assert!((bbox.x1 as f64 - exact_x1).abs() < 1.0);
        prop_assert!((bbox.y2 as f64 - exact_y2).abs() < 1.0);
        prop_assert_eq!(bbox.x1, exact_x1.trunc() as i32);
    }
}

#[test]
fn worked_geometry_example() {
    let record = DetectionRecord::new(0, 0.5, 0.5, 0.2, 0.4);
    let bbox = record.to_pixel_box(100, 200);
    assert_eq!((bbox.x1, bbox.y1, bbox.x2, bbox.y2), (40, 60, 60, 140));
}
