#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use signscope::labels::DetectionRecord;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Normalized coordinate in `[0, 1]`.
pub fn arb_unit() -> impl Strategy<Value = f64> {
    0.0f64..=1.0
}

/// A detection whose box lies inside the image.
pub fn arb_record() -> impl Strategy<Value = DetectionRecord> {
    (0u32..100, arb_unit(), arb_unit(), arb_unit(), arb_unit())
        .prop_map(|(class_id, cx, cy, w, h)| DetectionRecord::new(class_id, cx, cy, w, h))
}

/// Label file content made of valid rows.
pub fn arb_label_text(max_rows: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(arb_record(), 0..=max_rows).prop_map(|records| {
        records
            .iter()
            .map(|record| format!("{record}\n"))
            .collect::<String>()
    })
}
