//! Typed store of per-job inspection results.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::job::JobId;
use crate::detection::BoundingBox;
use crate::error::PanelscanError;
use crate::link::PanelAnomalyMap;

/// Everything computed for one job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InspectionResult {
    pub panels: Vec<BoundingBox>,
    pub anomalies: Vec<BoundingBox>,
    pub links: PanelAnomalyMap,
}

/// A job whose inputs could not be processed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedJob {
    pub id: JobId,
    pub message: String,
}

/// Results keyed by job id.
///
/// Ordered by id, so serialized output does not depend on processing order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsStore {
    results: BTreeMap<JobId, InspectionResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<SkippedJob>,
}

impl ResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a result, replacing any earlier result for the same job.
    ///
    /// A successful reprocess also clears an earlier skip for that job.
    pub fn insert(&mut self, id: JobId, result: InspectionResult) -> Option<InspectionResult> {
        self.skipped.retain(|s| s.id != id);
        self.results.insert(id, result)
    }

    /// Records a job that was skipped, dropping any earlier result for it.
    pub fn record_skip(&mut self, id: JobId, message: impl Into<String>) {
        self.results.remove(&id);
        self.skipped.retain(|s| s.id != id);
        self.skipped.push(SkippedJob {
            id,
            message: message.into(),
        });
    }

    pub fn get(&self, id: &JobId) -> Option<&InspectionResult> {
        self.results.get(id)
    }

    pub fn remove(&mut self, id: &JobId) -> Option<InspectionResult> {
        self.results.remove(id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterates results in job id order.
    pub fn iter(&self) -> impl Iterator<Item = (&JobId, &InspectionResult)> {
        self.results.iter()
    }

    /// Jobs that were skipped, in the order they were recorded.
    pub fn skipped(&self) -> &[SkippedJob] {
        &self.skipped
    }

    /// Renders the store as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Writes the store to a JSON file.
pub fn write_results_json(path: &Path, store: &ResultsStore) -> Result<(), PanelscanError> {
    let file = File::create(path).map_err(PanelscanError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, store).map_err(|source| {
        PanelscanError::JsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(PanelscanError::Io)
}
