//! Running jobs and collecting their results.
//!
//! A [`JobRecord`] carries the exact label paths the detection step wrote
//! for one image; [`process_job`] turns it into an [`InspectionResult`], and
//! [`process_jobs`] runs a whole [`JobManifest`] into a [`ResultsStore`].
//! A failing job is logged and recorded as skipped; it never stops the
//! remaining jobs.

mod job;
mod store;

pub use job::{read_job_manifest, JobId, JobManifest, JobRecord};
pub use store::{write_results_json, InspectionResult, ResultsStore, SkippedJob};

use crate::detection::ClassMap;
use crate::error::PanelscanError;
use crate::labels::read_label_file;
use crate::link::{link_anomalies_to_panels, LinkOptions};

/// Parses both label files of a job and links them.
///
/// Any parse error fails the whole job; a partially read file is not linked.
/// Invalid link options fail the job before any file is read.
pub fn process_job(
    job: &JobRecord,
    panel_classes: &ClassMap,
    anomaly_classes: &ClassMap,
    opts: &LinkOptions,
) -> Result<InspectionResult, PanelscanError> {
    opts.validate()?;
    let image = job.resolve_image_size()?;
    let panels = read_label_file(&job.panel_labels, panel_classes, image)?;
    let anomalies = read_label_file(&job.anomaly_labels, anomaly_classes, image)?;
    let links = link_anomalies_to_panels(&panels, &anomalies, opts);

    Ok(InspectionResult {
        panels,
        anomalies,
        links,
    })
}

/// Processes every job in the manifest, in order.
pub fn process_jobs(manifest: &JobManifest) -> ResultsStore {
    let mut store = ResultsStore::new();

    for job in &manifest.jobs {
        match process_job(
            job,
            &manifest.panel_classes,
            &manifest.anomaly_classes,
            &manifest.link,
        ) {
            Ok(result) => {
                tracing::info!(
                    job = %job.id,
                    panels = result.links.panels.len(),
                    linked = result.links.linked_count(),
                    unassigned = result.links.unassigned.len(),
                    "processed job"
                );
                store.insert(job.id.clone(), result);
            }
            Err(err) => {
                tracing::warn!(job = %job.id, "skipping linking: {err}");
                store.record_skip(job.id.clone(), err.to_string());
            }
        }
    }

    store
}
