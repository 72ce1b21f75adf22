//! Fuzz target for whole label files through to linking.
//!
//! The input is split at the first NUL byte into panel and anomaly label
//! text; whatever parses is linked. Linking must never panic.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use panelscan::detection::{BoxRole, ClassMap, ImageSize};
use panelscan::labels::parse_labels_str;
use panelscan::link::{link_anomalies_to_panels, LinkOptions, OverlapMetric};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (panel_text, anomaly_text) = text.split_once('\0').unwrap_or((text, ""));
    let Ok(image) = ImageSize::new(640, 480) else {
        return;
    };

    let parse = |content: &str, classes: &ClassMap| {
        match parse_labels_str(content, Path::new("<fuzz>"), classes, image) {
            Ok(boxes) => boxes,
            Err(failure) => failure.parsed,
        }
    };
    let panels = parse(panel_text, &ClassMap::panels());
    let anomalies = parse(anomaly_text, &ClassMap::anomalies());

    for metric in [OverlapMetric::Containment, OverlapMetric::Iou] {
        let opts = LinkOptions {
            metric,
            threshold: 0.0,
        };
        let map = link_anomalies_to_panels(&panels, &anomalies, &opts);
        let skipped_anomalies = map
            .skipped
            .iter()
            .filter(|s| s.role == BoxRole::Anomaly)
            .count();
        assert_eq!(map.anomaly_count() + skipped_anomalies, anomalies.len());
    }
});
