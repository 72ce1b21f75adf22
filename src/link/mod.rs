//! Spatial linking of anomaly detections to panel detections.
//!
//! Every anomaly is assigned to at most one panel, the one it overlaps
//! most under the configured [`OverlapMetric`]. Anomalies that overlap no
//! panel well enough land in an explicit unassigned bucket.
//!
//! The result depends only on the inputs and their order: panels are scanned
//! in index order and only a strictly greater score replaces the current
//! best, so ties go to the lower panel index.

pub mod io_csv;
mod report;

pub use report::{ClassCount, LinkedAnomaly, PanelAnomalyMap, PanelEntry, SkippedBox};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::detection::{BoundingBox, BoxRole};
use crate::error::PanelscanError;

/// How overlap between an anomaly and a panel is scored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapMetric {
    /// Fraction of the anomaly's area inside the panel.
    #[default]
    Containment,
    /// Intersection over union of the two boxes.
    Iou,
}

impl fmt::Display for OverlapMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapMetric::Containment => write!(f, "containment"),
            OverlapMetric::Iou => write!(f, "iou"),
        }
    }
}

impl FromStr for OverlapMetric {
    type Err = PanelscanError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "containment" => Ok(OverlapMetric::Containment),
            "iou" => Ok(OverlapMetric::Iou),
            other => Err(PanelscanError::UnsupportedFormat(format!(
                "overlap metric '{other}' (supported: containment, iou)"
            ))),
        }
    }
}

/// Linking options.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkOptions {
    pub metric: OverlapMetric,
    /// Minimum score for a link. At 0.0 any nonzero overlap links.
    pub threshold: f64,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            metric: OverlapMetric::Containment,
            threshold: 0.0,
        }
    }
}

impl LinkOptions {
    /// Checks that the threshold is a finite value within `[0, 1]`.
    pub fn validate(&self) -> Result<(), PanelscanError> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(PanelscanError::InvalidLinkOptions {
                message: format!("threshold {} must be within [0, 1]", self.threshold),
            });
        }
        Ok(())
    }
}

/// Scores one anomaly against one panel.
#[inline]
pub fn overlap(metric: OverlapMetric, panel: &BoundingBox, anomaly: &BoundingBox) -> f64 {
    match metric {
        OverlapMetric::Containment => anomaly.bbox.containment_in(&panel.bbox),
        OverlapMetric::Iou => anomaly.bbox.iou(&panel.bbox),
    }
}

/// Finds the best-scoring panel for `anomaly` among `candidates`.
///
/// `candidates` yields `(panel_index, panel)` in ascending index order.
/// Returns `None` only when there are no candidates.
pub fn best_panel<'a>(
    metric: OverlapMetric,
    anomaly: &BoundingBox,
    candidates: impl IntoIterator<Item = (usize, &'a BoundingBox)>,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, panel) in candidates {
        let score = overlap(metric, panel, anomaly);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }
    best
}

/// Links each anomaly to the panel it most plausibly belongs to.
///
/// Degenerate boxes (zero or negative area, non-finite coordinates) in
/// either list are logged, recorded in [`PanelAnomalyMap::skipped`] and left
/// out of linking. Panel indices in the result always refer to positions in
/// `panels`.
pub fn link_anomalies_to_panels(
    panels: &[BoundingBox],
    anomalies: &[BoundingBox],
    opts: &LinkOptions,
) -> PanelAnomalyMap {
    let mut map = PanelAnomalyMap::new(opts);

    let usable_panels = usable_boxes(BoxRole::Panel, panels, &mut map);
    let usable_anomalies = usable_boxes(BoxRole::Anomaly, anomalies, &mut map);

    map.panels = usable_panels
        .iter()
        .map(|(index, panel)| PanelEntry::new(*index, panel))
        .collect();

    for (anomaly_index, anomaly) in usable_anomalies {
        let best = best_panel(opts.metric, anomaly, usable_panels.iter().copied());
        let best_score = best.map(|(_, score)| score).unwrap_or(0.0);
        let record = LinkedAnomaly::new(anomaly_index, anomaly, best_score);

        match best {
            Some((panel_index, score)) if score > 0.0 && score >= opts.threshold => {
                // Entries are in ascending panel index order.
                if let Ok(slot) = map
                    .panels
                    .binary_search_by_key(&panel_index, |entry| entry.index)
                {
                    map.panels[slot].anomalies.push(record);
                }
            }
            _ => {
                tracing::debug!(
                    anomaly_index,
                    class = %anomaly.class_name,
                    best_score,
                    "anomaly left unassigned"
                );
                map.unassigned.push(record);
            }
        }
    }

    tracing::debug!(
        panels = map.panels.len(),
        linked = map.linked_count(),
        unassigned = map.unassigned.len(),
        skipped = map.skipped.len(),
        metric = %opts.metric,
        "linked anomalies to panels"
    );
    map
}

/// Returns `(index, box)` for non-degenerate boxes, recording the rest.
fn usable_boxes<'a>(
    role: BoxRole,
    boxes: &'a [BoundingBox],
    map: &mut PanelAnomalyMap,
) -> Vec<(usize, &'a BoundingBox)> {
    let mut usable = Vec::with_capacity(boxes.len());
    for (index, bbox) in boxes.iter().enumerate() {
        match check_degenerate(role, index, bbox) {
            Ok(()) => usable.push((index, bbox)),
            Err(err) => {
                tracing::warn!("{err}; skipping");
                map.skipped.push(SkippedBox {
                    role,
                    index,
                    reason: err.to_string(),
                });
            }
        }
    }
    usable
}

fn check_degenerate(role: BoxRole, index: usize, bbox: &BoundingBox) -> Result<(), PanelscanError> {
    if bbox.bbox.is_degenerate() {
        return Err(PanelscanError::DegenerateBox {
            role,
            index,
            message: format!(
                "'{}' box {:?} has no positive area",
                bbox.class_name, bbox.bbox
            ),
        });
    }
    Ok(())
}
