//! Criterion microbenches for label parsing, tallying and box rendering.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use image::RgbImage;
use signscope::labels::{parse_label_line, parse_label_text, DetectionRecord};
use signscope::overlay::{LabelFont, OverlayRenderer};
use signscope::stats::ClassTally;
use signscope::style::StyleTable;

const LABEL_FIXTURE: &str = "36 0.512 0.431 0.120 0.210
26 0.250 0.250 0.100 0.100
23 0.731 0.602 0.084 0.143
36 0.118 0.904 0.051 0.062

28 0.5 0.5 1.2 1.2
bad line
22 0.333 0.333 0.333 0.333
";

fn bench_parse_line(c: &mut Criterion) {
    let line = "36 0.512 0.431 0.120 0.210";
    let mut group = c.benchmark_group("label_parse");
    group.throughput(Throughput::Bytes(line.len() as u64));

    group.bench_function("parse_label_line", |b| {
        b.iter(|| black_box(parse_label_line(black_box(line))))
    });

    group.finish();
}

fn bench_parse_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("label_parse");
    group.throughput(Throughput::Bytes(LABEL_FIXTURE.len() as u64));

    group.bench_function("parse_label_text", |b| {
        b.iter(|| black_box(parse_label_text(black_box(LABEL_FIXTURE))))
    });

    group.finish();
}

/// Tally 500 label files' worth of text.
fn bench_tally(c: &mut Criterion) {
    let mut group = c.benchmark_group("tally");
    group.throughput(Throughput::Bytes((LABEL_FIXTURE.len() * 500) as u64));

    group.bench_function("add_label_text_x500", |b| {
        b.iter(|| {
            let mut tally = ClassTally::new();
            for _ in 0..500 {
                tally.add_label_text(black_box(LABEL_FIXTURE));
            }
            black_box(tally)
        })
    });

    group.finish();
}

/// Draw a handful of boxes onto a 640x480 frame, including one that spills
/// past the edges.
fn bench_render(c: &mut Criterion) {
    let styles = StyleTable::traffic_signs();
    let font = LabelFont::fallback();
    let renderer = OverlayRenderer::new(&styles, &font);
    let frame = RgbImage::new(640, 480);
    let records: Vec<DetectionRecord> = parse_label_text(LABEL_FIXTURE)
        .into_iter()
        .map(|(_, record)| record)
        .collect();

    let mut group = c.benchmark_group("overlay");
    group.bench_function("render_640x480", |b| {
        b.iter(|| black_box(renderer.render(black_box(&frame), &records)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_line,
    bench_parse_text,
    bench_tally,
    bench_render
);
criterion_main!(benches);
