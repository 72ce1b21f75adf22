#![allow(dead_code)]

use panelscan::detection::{BBoxXYXY, BoundingBox, Pixel};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const IMAGE_W: f64 = 640.0;
pub const IMAGE_H: f64 = 480.0;

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

/// A non-degenerate pixel box inside a `IMAGE_W x IMAGE_H` image.
///
/// Corners sit on a quarter-pixel grid so overlap ties are exact.
pub fn arb_bbox() -> BoxedStrategy<BBoxXYXY<Pixel>> {
    let max_x = (IMAGE_W * 4.0) as u32;
    let max_y = (IMAGE_H * 4.0) as u32;
    (0..max_x - 1, 0..max_y - 1)
        .prop_flat_map(move |(x0, y0)| (Just(x0), Just(y0), (x0 + 1)..=max_x, (y0 + 1)..=max_y))
        .prop_map(|(x0, y0, x1, y1)| {
            BBoxXYXY::from_xyxy(
                x0 as f64 / 4.0,
                y0 as f64 / 4.0,
                x1 as f64 / 4.0,
                y1 as f64 / 4.0,
            )
        })
        .boxed()
}

pub fn arb_panels(max: usize) -> BoxedStrategy<Vec<BoundingBox>> {
    proptest::collection::vec(arb_bbox(), 0..=max)
        .prop_map(|boxes| {
            boxes
                .into_iter()
                .map(|bbox| BoundingBox::new(0, "panel", bbox))
                .collect()
        })
        .boxed()
}

pub fn arb_anomalies(max: usize) -> BoxedStrategy<Vec<BoundingBox>> {
    proptest::collection::vec((arb_bbox(), 0u32..3, proptest::option::of(0.0f64..=1.0)), 0..=max)
        .prop_map(|rows| {
            rows.into_iter()
                .map(|(bbox, class_id, confidence)| {
                    let name = ["cracked", "dusty", "normal"][class_id as usize];
                    BoundingBox {
                        class_id,
                        class_name: name.to_string(),
                        bbox,
                        confidence,
                    }
                })
                .collect()
        })
        .boxed()
}
