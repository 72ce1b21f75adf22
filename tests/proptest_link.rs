use std::collections::BTreeSet;

use panelscan::detection::{BBoxXYXY, BoundingBox};
use panelscan::link::{best_panel, link_anomalies_to_panels, overlap, LinkOptions, OverlapMetric};
use proptest::prelude::*;

mod proptest_helpers;

fn arb_options() -> impl Strategy<Value = LinkOptions> {
    (
        prop_oneof![Just(OverlapMetric::Containment), Just(OverlapMetric::Iou)],
        prop_oneof![Just(0.0), 0.0f64..=1.0],
    )
        .prop_map(|(metric, threshold)| LinkOptions { metric, threshold })
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn linking_is_deterministic(
        panels in proptest_helpers::arb_panels(8),
        anomalies in proptest_helpers::arb_anomalies(12),
        opts in arb_options(),
    ) {
        let first = serde_json::to_vec(&link_anomalies_to_panels(&panels, &anomalies, &opts))
            .expect("serialize first");
        let second = serde_json::to_vec(&link_anomalies_to_panels(&panels, &anomalies, &opts))
            .expect("serialize second");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_anomaly_is_placed_exactly_once(
        panels in proptest_helpers::arb_panels(8),
        anomalies in proptest_helpers::arb_anomalies(12),
        opts in arb_options(),
    ) {
        let map = link_anomalies_to_panels(&panels, &anomalies, &opts);

        let mut seen = BTreeSet::new();
        for (_, record) in map.records() {
            prop_assert!(seen.insert(record.anomaly_index), "anomaly {} placed twice", record.anomaly_index);
        }
        prop_assert_eq!(seen.len(), anomalies.len());
        prop_assert_eq!(map.panels.len(), panels.len());
    }

    #[test]
    fn links_go_to_the_first_best_panel(
        panels in proptest_helpers::arb_panels(8),
        anomalies in proptest_helpers::arb_anomalies(12),
        opts in arb_options(),
    ) {
        let map = link_anomalies_to_panels(&panels, &anomalies, &opts);

        for entry in &map.panels {
            for record in &entry.anomalies {
                let anomaly = &anomalies[record.anomaly_index];
                let scores: Vec<f64> = panels.iter().map(|p| overlap(opts.metric, p, anomaly)).collect();
                let max = scores.iter().cloned().fold(0.0, f64::max);
                let first_max = scores.iter().position(|s| *s == max).expect("max exists");

                prop_assert_eq!(entry.index, first_max);
                prop_assert_eq!(record.overlap, max);
                prop_assert!(record.overlap > 0.0 && record.overlap >= opts.threshold);
            }
        }

        for record in &map.unassigned {
            let anomaly = &anomalies[record.anomaly_index];
            let best = best_panel(opts.metric, anomaly, panels.iter().enumerate())
                .map(|(_, score)| score)
                .unwrap_or(0.0);
            prop_assert!(best == 0.0 || best < opts.threshold);
        }
    }

    #[test]
    fn fully_contained_anomaly_beats_partial_overlap(
        panel in proptest_helpers::arb_bbox(),
        shift in 0.25f64..=100.0,
    ) {
        // Anomaly is the middle of `panel`; the second panel is the same box
        // shifted right so it covers the anomaly only partially (or not at all).
        let w = panel.width();
        let h = panel.height();
        let inner = BBoxXYXY::from_xyxy(
            panel.x_min + w / 4.0,
            panel.y_min + h / 4.0,
            panel.x_max - w / 4.0,
            panel.y_max - h / 4.0,
        );
        let shift = shift.max(w / 4.0 + 0.25);
        let shifted = BBoxXYXY::from_xyxy(panel.x_min + shift, panel.y_min, panel.x_max + shift, panel.y_max);

        let panels = vec![
            BoundingBox::new(0, "panel", shifted),
            BoundingBox::new(0, "panel", panel),
        ];
        let anomalies = vec![BoundingBox::new(0, "cracked", inner)];

        let map = link_anomalies_to_panels(&panels, &anomalies, &LinkOptions::default());
        prop_assert_eq!(map.panel(1).map(|e| e.anomalies.len()), Some(1));
        prop_assert_eq!(map.panel(0).map(|e| e.anomalies.len()), Some(0));
    }
}
