//! Job records and the manifest that lists them.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detection::{ClassMap, ImageSize};
use crate::error::PanelscanError;
use crate::link::LinkOptions;

/// Opaque identifier for one processed upload.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({:?})", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        JobId::new(id)
    }
}

/// The exact outputs the detection step produced for one image.
///
/// Label paths are recorded when detection runs, so nothing is searched for
/// at link time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,

    /// Image the labels describe; its header supplies the size when
    /// `image_size` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,

    /// Explicit image size, taking precedence over `image`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,

    /// Label file written by the panel detector.
    pub panel_labels: PathBuf,

    /// Label file written by the anomaly detector.
    pub anomaly_labels: PathBuf,
}

impl JobRecord {
    /// Creates a record with an explicit image size.
    pub fn with_size(
        id: impl Into<JobId>,
        image_size: ImageSize,
        panel_labels: impl Into<PathBuf>,
        anomaly_labels: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            image: None,
            image_size: Some(image_size),
            panel_labels: panel_labels.into(),
            anomaly_labels: anomaly_labels.into(),
        }
    }

    /// Creates a record that takes its size from an image file.
    pub fn with_image(
        id: impl Into<JobId>,
        image: impl Into<PathBuf>,
        panel_labels: impl Into<PathBuf>,
        anomaly_labels: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            image: Some(image.into()),
            image_size: None,
            panel_labels: panel_labels.into(),
            anomaly_labels: anomaly_labels.into(),
        }
    }

    /// Resolves the image size from the explicit size or the image header.
    pub fn resolve_image_size(&self) -> Result<ImageSize, PanelscanError> {
        match (self.image_size, &self.image) {
            (Some(size), _) => ImageSize::new(size.width, size.height),
            (None, Some(path)) => ImageSize::from_image_file(path),
            (None, None) => Err(PanelscanError::InvalidImageSize {
                message: format!("job '{}' has neither image nor image_size", self.id),
            }),
        }
    }

    /// Resolves relative paths against `base`.
    pub fn rebased(mut self, base: &Path) -> Self {
        let rebase = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.image = self.image.map(rebase);
        self.panel_labels = rebase(self.panel_labels);
        self.anomaly_labels = rebase(self.anomaly_labels);
        self
    }
}

/// A batch of jobs plus the settings shared by all of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobManifest {
    #[serde(default)]
    pub link: LinkOptions,

    #[serde(default = "ClassMap::panels")]
    pub panel_classes: ClassMap,

    #[serde(default = "ClassMap::anomalies")]
    pub anomaly_classes: ClassMap,

    pub jobs: Vec<JobRecord>,
}

impl JobManifest {
    /// Creates a manifest with default link options and class maps.
    pub fn new(jobs: Vec<JobRecord>) -> Self {
        Self {
            link: LinkOptions::default(),
            panel_classes: ClassMap::panels(),
            anomaly_classes: ClassMap::anomalies(),
            jobs,
        }
    }
}

/// Reads a JSON job manifest.
///
/// Relative paths inside the manifest are resolved against the manifest's
/// directory.
pub fn read_job_manifest(path: &Path) -> Result<JobManifest, PanelscanError> {
    let file = File::open(path).map_err(|source| PanelscanError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut manifest: JobManifest =
        serde_json::from_reader(reader).map_err(|source| PanelscanError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;
    manifest.link.validate()?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    manifest.jobs = manifest
        .jobs
        .into_iter()
        .map(|job| job.rebased(base))
        .collect();

    tracing::info!(path = %path.display(), jobs = manifest.jobs.len(), "loaded job manifest");
    Ok(manifest)
}
