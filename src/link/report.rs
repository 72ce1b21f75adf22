//! Link map types and text formatting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{LinkOptions, OverlapMetric};
use crate::detection::{BBoxXYXY, BoundingBox, BoxRole, Pixel};

/// Panel → anomalies mapping for one image.
///
/// Each anomaly appears exactly once: in one panel's list, in
/// `unassigned`, or (if its box was degenerate) in `skipped`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelAnomalyMap {
    /// Metric used to score overlaps.
    pub metric: OverlapMetric,
    /// Minimum score that was required for a link.
    pub threshold: f64,
    /// Usable panels in ascending index order.
    pub panels: Vec<PanelEntry>,
    /// Anomalies that did not overlap any panel enough.
    pub unassigned: Vec<LinkedAnomaly>,
    /// Degenerate boxes left out of linking.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedBox>,
}

impl PanelAnomalyMap {
    /// Creates an empty map for the given options.
    pub fn new(opts: &LinkOptions) -> Self {
        Self {
            metric: opts.metric,
            threshold: opts.threshold,
            panels: Vec::new(),
            unassigned: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Looks up the entry for a panel by its index in the input list.
    pub fn panel(&self, index: usize) -> Option<&PanelEntry> {
        self.panels
            .binary_search_by_key(&index, |entry| entry.index)
            .ok()
            .map(|slot| &self.panels[slot])
    }

    /// Number of anomalies linked to some panel.
    pub fn linked_count(&self) -> usize {
        self.panels.iter().map(|p| p.anomalies.len()).sum()
    }

    /// Number of anomalies that took part in linking.
    pub fn anomaly_count(&self) -> usize {
        self.linked_count() + self.unassigned.len()
    }

    /// Per-class anomaly counts, ordered by class name.
    pub fn class_counts(&self) -> BTreeMap<String, ClassCount> {
        let mut counts: BTreeMap<String, ClassCount> = BTreeMap::new();
        for anomaly in self.panels.iter().flat_map(|p| &p.anomalies) {
            counts
                .entry(anomaly.class_name.clone())
                .or_default()
                .linked += 1;
        }
        for anomaly in &self.unassigned {
            counts
                .entry(anomaly.class_name.clone())
                .or_default()
                .unassigned += 1;
        }
        counts
    }

    /// Iterates over all anomaly records with the key of their panel
    /// (`None` for unassigned), panels first.
    pub fn records(&self) -> impl Iterator<Item = (Option<&str>, &LinkedAnomaly)> {
        self.panels
            .iter()
            .flat_map(|p| p.anomalies.iter().map(move |a| (Some(p.key.as_str()), a)))
            .chain(self.unassigned.iter().map(|a| (None, a)))
    }
}

/// Linked and unassigned counts for one anomaly class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    pub linked: usize,
    pub unassigned: usize,
}

/// One panel and the anomalies assigned to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelEntry {
    /// Index of the panel in the input list.
    pub index: usize,
    /// Stable key, `panel_<index>`.
    pub key: String,
    pub class_name: String,
    #[serde(flatten)]
    pub bbox: BBoxXYXY<Pixel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Assigned anomalies in input order.
    pub anomalies: Vec<LinkedAnomaly>,
}

impl PanelEntry {
    pub(crate) fn new(index: usize, panel: &BoundingBox) -> Self {
        Self {
            index,
            key: format!("panel_{index}"),
            class_name: panel.class_name.clone(),
            bbox: panel.bbox,
            confidence: panel.confidence,
            anomalies: Vec::new(),
        }
    }
}

/// An anomaly together with the overlap score that placed it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkedAnomaly {
    /// Index of the anomaly in the input list.
    pub anomaly_index: usize,
    pub class_name: String,
    #[serde(flatten)]
    pub bbox: BBoxXYXY<Pixel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Best score found; for unassigned anomalies it may be 0.
    pub overlap: f64,
}

impl LinkedAnomaly {
    pub(crate) fn new(anomaly_index: usize, anomaly: &BoundingBox, overlap: f64) -> Self {
        Self {
            anomaly_index,
            class_name: anomaly.class_name.clone(),
            bbox: anomaly.bbox,
            confidence: anomaly.confidence,
            overlap,
        }
    }
}

/// A degenerate box that was left out of linking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedBox {
    pub role: BoxRole,
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for PanelAnomalyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Linked {} of {} anomalies to {} panel(s) (metric: {}, threshold: {})",
            self.linked_count(),
            self.anomaly_count(),
            self.panels.len(),
            self.metric,
            self.threshold
        )?;

        for panel in &self.panels {
            writeln!(f)?;
            writeln!(
                f,
                "{} [{:.1}, {:.1}, {:.1}, {:.1}]: {} anomalies",
                panel.key,
                panel.bbox.x_min,
                panel.bbox.y_min,
                panel.bbox.x_max,
                panel.bbox.y_max,
                panel.anomalies.len()
            )?;
            for anomaly in &panel.anomalies {
                writeln!(f, "  {}", AnomalyLine(anomaly))?;
            }
        }

        if !self.unassigned.is_empty() {
            writeln!(f)?;
            writeln!(f, "unassigned: {} anomalies", self.unassigned.len())?;
            for anomaly in &self.unassigned {
                writeln!(f, "  {}", AnomalyLine(anomaly))?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "skipped: {} degenerate box(es)", self.skipped.len())?;
            for skipped in &self.skipped {
                writeln!(f, "  {} #{}: {}", skipped.role, skipped.index, skipped.reason)?;
            }
        }

        let counts = self.class_counts();
        if !counts.is_empty() {
            writeln!(f)?;
            writeln!(f, "By class:")?;
            for (class, count) in counts {
                writeln!(
                    f,
                    "  {:<12} {} linked, {} unassigned",
                    class, count.linked, count.unassigned
                )?;
            }
        }

        Ok(())
    }
}

struct AnomalyLine<'a>(&'a LinkedAnomaly);

impl fmt::Display for AnomalyLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;
        write!(
            f,
            "#{} {} [{:.1}, {:.1}, {:.1}, {:.1}] overlap={:.3}",
            a.anomaly_index, a.class_name, a.bbox.x_min, a.bbox.y_min, a.bbox.x_max, a.bbox.y_max,
            a.overlap
        )?;
        if let Some(conf) = a.confidence {
            write!(f, " conf={:.2}", conf)?;
        }
        Ok(())
    }
}
