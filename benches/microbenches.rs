//! Criterion microbenches for label parsing and linking.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure:
//! - Label parsing from an in-memory string (parse_labels_str)
//! - Linking at per-image scale and at a dense-frame scale

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use std::path::Path;

use panelscan::detection::{ClassMap, ImageSize};
use panelscan::labels::parse_labels_str;
use panelscan::link::{link_anomalies_to_panels, LinkOptions};

/// Panels on a `cols x rows` grid, one anomaly in every panel plus one
/// straddling each vertical seam.
fn grid_labels(cols: usize, rows: usize) -> (String, String) {
    let cell_w = 1.0 / cols as f64;
    let cell_h = 1.0 / rows as f64;
    let mut panels = String::new();
    let mut anomalies = String::new();

    for r in 0..rows {
        for c in 0..cols {
            let cx = (c as f64 + 0.5) * cell_w;
            let cy = (r as f64 + 0.5) * cell_h;
            panels.push_str(&format!(
                "0 {cx:.6} {cy:.6} {:.6} {:.6} 0.9\n",
                cell_w * 0.95,
                cell_h * 0.95
            ));
            anomalies.push_str(&format!(
                "{} {cx:.6} {cy:.6} {:.6} {:.6} 0.7\n",
                (r + c) % 3,
                cell_w * 0.2,
                cell_h * 0.2
            ));
            if c + 1 < cols {
                let seam = (c as f64 + 1.0) * cell_w;
                anomalies.push_str(&format!(
                    "1 {seam:.6} {cy:.6} {:.6} {:.6} 0.5\n",
                    cell_w * 0.1,
                    cell_h * 0.1
                ));
            }
        }
    }

    (panels, anomalies)
}

fn image() -> ImageSize {
    ImageSize::new(4000, 3000).expect("valid size")
}

/// Benchmark label parsing from string.
fn bench_parse(c: &mut Criterion) {
    let (_, anomalies) = grid_labels(8, 6);
    let classes = ClassMap::anomalies();

    let mut group = c.benchmark_group("label_parse");
    group.throughput(Throughput::Bytes(anomalies.len() as u64));

    group.bench_function("parse_labels_str", |b| {
        b.iter(|| {
            let boxes = parse_labels_str(
                black_box(&anomalies),
                Path::new("<bench>"),
                &classes,
                image(),
            )
            .unwrap();
            black_box(boxes)
        })
    });

    group.finish();
}

/// Benchmark linking for a typical and a dense image.
fn bench_link(c: &mut Criterion) {
    let mut group = c.benchmark_group("link");

    for (name, cols, rows) in [("typical_4x3", 4, 3), ("dense_16x12", 16, 12)] {
        let (panel_labels, anomaly_labels) = grid_labels(cols, rows);
        let panels = parse_labels_str(
            &panel_labels,
            Path::new("<bench>"),
            &ClassMap::panels(),
            image(),
        )
        .expect("parse panel labels");
        let anomalies = parse_labels_str(
            &anomaly_labels,
            Path::new("<bench>"),
            &ClassMap::anomalies(),
            image(),
        )
        .expect("parse anomaly labels");
        let opts = LinkOptions::default();

        group.throughput(Throughput::Elements((panels.len() * anomalies.len()) as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let map = link_anomalies_to_panels(black_box(&panels), black_box(&anomalies), &opts);
                black_box(map)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_link);
criterion_main!(benches);
