//! Detection records shared by the label parser and the linker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::bbox::BBoxXYXY;
use super::space::Pixel;
use crate::error::PanelscanError;

/// One detected object instance in pixel space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Raw class id from the label line.
    pub class_id: u32,

    /// Human-readable class name resolved through a [`ClassMap`].
    pub class_name: String,

    /// Box corners in pixels.
    #[serde(flatten)]
    pub bbox: BBoxXYXY<Pixel>,

    /// Detector confidence; absent for ground-truth labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl BoundingBox {
    /// Creates a box without a confidence score.
    pub fn new(class_id: u32, class_name: impl Into<String>, bbox: BBoxXYXY<Pixel>) -> Self {
        Self {
            class_id,
            class_name: class_name.into(),
            bbox,
            confidence: None,
        }
    }

    /// Adds a confidence score.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Which detector a box came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxRole {
    Panel,
    Anomaly,
}

impl fmt::Display for BoxRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxRole::Panel => write!(f, "panel"),
            BoxRole::Anomaly => write!(f, "anomaly"),
        }
    }
}

/// Pixel dimensions of the image a label file describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    /// Creates a size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, PanelscanError> {
        if width == 0 || height == 0 {
            return Err(PanelscanError::InvalidImageSize {
                message: format!("{width}x{height} (must be positive)"),
            });
        }
        Ok(Self { width, height })
    }

    /// Reads the dimensions from an image file header.
    pub fn from_image_file(path: &Path) -> Result<Self, PanelscanError> {
        let size = imagesize::size(path).map_err(|source| PanelscanError::ImageDimensionRead {
            path: path.to_path_buf(),
            source,
        })?;

        let width: u32 = size
            .width
            .try_into()
            .map_err(|_| PanelscanError::InvalidImageSize {
                message: format!("image width {} does not fit in u32", size.width),
            })?;
        let height: u32 = size
            .height
            .try_into()
            .map_err(|_| PanelscanError::InvalidImageSize {
                message: format!("image height {} does not fit in u32", size.height),
            })?;

        Self::new(width, height)
    }
}

impl std::str::FromStr for ImageSize {
    type Err = PanelscanError;

    /// Parses `WIDTHxHEIGHT`, e.g. `1920x1080`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || PanelscanError::InvalidImageSize {
            message: format!("'{raw}' (expected WIDTHxHEIGHT)"),
        };
        let (w, h) = raw
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
        Self::new(width, height)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Mapping from integer class id to class name.
///
/// Ordered so that serialized maps and listings are stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassMap(BTreeMap<u32, String>);

impl ClassMap {
    /// The panel detector's classes: `{0: "panel"}`.
    pub fn panels() -> Self {
        Self::from_pairs([(0, "panel")])
    }

    /// The anomaly detector's classes: `{0: "cracked", 1: "dusty", 2: "normal"}`.
    pub fn anomalies() -> Self {
        Self::from_pairs([(0, "cracked"), (1, "dusty"), (2, "normal")])
    }

    /// Builds a map from `(id, name)` pairs. Later duplicates win.
    pub fn from_pairs<N: Into<String>>(pairs: impl IntoIterator<Item = (u32, N)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(id, name)| (id, name.into()))
                .collect(),
        )
    }

    /// Builds a map from a list of names, where the position is the id.
    pub fn from_names<N: Into<String>>(names: impl IntoIterator<Item = N>) -> Self {
        Self(
            names
                .into_iter()
                .enumerate()
                .map(|(id, name)| (id as u32, name.into()))
                .collect(),
        )
    }

    /// Looks up the name for a class id.
    pub fn name(&self, class_id: u32) -> Option<&str> {
        self.0.get(&class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(id, name)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.0.iter().map(|(id, name)| (*id, name.as_str()))
    }
}
