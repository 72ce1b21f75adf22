//! Flat CSV export of a link map.
//!
//! One row per anomaly, panels first, then unassigned anomalies with an
//! empty `panel` column:
//!
//! ```text
//! panel,anomaly_index,class_name,x_min,y_min,x_max,y_max,confidence,overlap
//! panel_0,0,cracked,10.0,10.0,20.0,20.0,0.8,1.0
//! ,1,dusty,200.0,200.0,210.0,210.0,,0.0
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use super::PanelAnomalyMap;
use crate::error::PanelscanError;

#[derive(Debug, Serialize)]
struct LinkRow<'a> {
    panel: Option<&'a str>,
    anomaly_index: usize,
    class_name: &'a str,
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
    confidence: Option<f64>,
    overlap: f64,
}

fn write_rows<W: Write>(
    writer: W,
    map: &PanelAnomalyMap,
    path: &Path,
) -> Result<W, PanelscanError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut wrote_any = false;

    for (panel, anomaly) in map.records() {
        csv_writer
            .serialize(LinkRow {
                panel,
                anomaly_index: anomaly.anomaly_index,
                class_name: &anomaly.class_name,
                x_min: anomaly.bbox.x_min,
                y_min: anomaly.bbox.y_min,
                x_max: anomaly.bbox.x_max,
                y_max: anomaly.bbox.y_max,
                confidence: anomaly.confidence,
                overlap: anomaly.overlap,
            })
            .map_err(|source| PanelscanError::CsvWrite {
                path: path.to_path_buf(),
                source,
            })?;
        wrote_any = true;
    }

    // serde only emits the header alongside the first row.
    if !wrote_any {
        csv_writer
            .write_record([
                "panel",
                "anomaly_index",
                "class_name",
                "x_min",
                "y_min",
                "x_max",
                "y_max",
                "confidence",
                "overlap",
            ])
            .map_err(|source| PanelscanError::CsvWrite {
                path: path.to_path_buf(),
                source,
            })?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| PanelscanError::Io(e.into_error()))
}

/// Writes the link map as CSV to a file.
pub fn write_links_csv(path: &Path, map: &PanelAnomalyMap) -> Result<(), PanelscanError> {
    let file = File::create(path).map_err(PanelscanError::Io)?;
    write_rows(BufWriter::new(file), map, path)?
        .flush()
        .map_err(PanelscanError::Io)
}

/// Renders the link map as a CSV string.
pub fn to_links_csv_string(map: &PanelAnomalyMap) -> Result<String, PanelscanError> {
    let bytes = write_rows(Vec::new(), map, Path::new("<string>"))?;
    String::from_utf8(bytes)
        .map_err(|e| PanelscanError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
