//! YOLO-style label file parsing.
//!
//! Each line of a label file describes one detection:
//!
//! ```text
//! class_id cx cy w h [confidence]
//! ```
//!
//! with `cx cy w h` normalized to the image size. Parsing resolves the class
//! id through a [`ClassMap`], converts to pixel corners and clamps the result
//! to the image bounds.

mod class_map;

pub use class_map::read_class_map;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::detection::{BBoxXYXY, BoundingBox, ClassMap, ImageSize, Normalized};
use crate::error::PanelscanError;

/// One parsed label line, still in normalized coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelRow {
    pub class_id: u32,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
    pub confidence: Option<f64>,
}

/// A label file that failed part-way through.
///
/// Parsing stops at the first bad line; `parsed` holds every box read before
/// it, in file order. For a missing file `parsed` is empty.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct LabelReadFailure {
    pub parsed: Vec<BoundingBox>,
    #[source]
    pub error: PanelscanError,
}

impl LabelReadFailure {
    /// Splits into the parsed prefix and the error that stopped parsing.
    pub fn into_parts(self) -> (Vec<BoundingBox>, PanelscanError) {
        (self.parsed, self.error)
    }
}

impl From<LabelReadFailure> for PanelscanError {
    fn from(failure: LabelReadFailure) -> Self {
        failure.error
    }
}

/// Reads one label file into pixel-space boxes, in file order.
///
/// # Errors
/// - [`PanelscanError::LabelFileNotFound`] if `path` does not exist.
/// - [`PanelscanError::MalformedLabel`] for a line with the wrong field
///   count or a non-numeric field.
/// - [`PanelscanError::UnknownClass`] for a class id absent from `classes`.
///
/// Line errors carry the boxes parsed before the failing line.
pub fn read_label_file(
    path: &Path,
    classes: &ClassMap,
    image: ImageSize,
) -> Result<Vec<BoundingBox>, LabelReadFailure> {
    let content = fs::read_to_string(path).map_err(|err| LabelReadFailure {
        parsed: Vec::new(),
        error: if err.kind() == ErrorKind::NotFound {
            PanelscanError::LabelFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PanelscanError::Io(err)
        },
    })?;

    let boxes = parse_labels_str(&content, path, classes, image)?;
    tracing::debug!(
        path = %path.display(),
        boxes = boxes.len(),
        image = %image,
        "parsed label file"
    );
    Ok(boxes)
}

/// Parses label file content already held in memory.
///
/// `path` is only used for error messages.
pub fn parse_labels_str(
    content: &str,
    path: &Path,
    classes: &ClassMap,
    image: ImageSize,
) -> Result<Vec<BoundingBox>, LabelReadFailure> {
    let width = image.width as f64;
    let height = image.height as f64;
    let mut boxes = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        let row = match parse_label_line(line, path, line_num) {
            Ok(Some(row)) => row,
            Ok(None) => continue,
            Err(error) => {
                return Err(LabelReadFailure {
                    parsed: boxes,
                    error,
                })
            }
        };

        let Some(class_name) = classes.name(row.class_id) else {
            return Err(LabelReadFailure {
                parsed: boxes,
                error: PanelscanError::UnknownClass {
                    path: path.to_path_buf(),
                    line: line_num,
                    class_id: row.class_id,
                },
            });
        };

        let bbox = BBoxXYXY::<Normalized>::from_cxcywh(row.cx, row.cy, row.w, row.h)
            .to_pixel(width, height)
            .clamp_to(width, height);

        boxes.push(BoundingBox {
            class_id: row.class_id,
            class_name: class_name.to_string(),
            bbox,
            confidence: row.confidence,
        });
    }

    Ok(boxes)
}

/// Parses a single label line.
///
/// Blank lines yield `Ok(None)`.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<LabelRow>, PanelscanError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let malformed = |message: String| PanelscanError::MalformedLabel {
        path: file_path.to_path_buf(),
        line: line_num,
        message,
    };

    // Take at most 7 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(7).collect();
    if !(5..=6).contains(&tokens.len()) {
        return Err(malformed(format!(
            "expected 5 or 6 fields (class_id cx cy w h [confidence]), found {}",
            if tokens.len() == 7 {
                "more than 6".to_string()
            } else {
                tokens.len().to_string()
            }
        )));
    }

    let class_id = tokens[0].parse::<u32>().map_err(|_| {
        malformed(format!(
            "invalid class_id '{}'; expected non-negative integer",
            tokens[0]
        ))
    })?;

    let parse_f64 = |raw: &str, field_name: &str| -> Result<f64, PanelscanError> {
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(malformed(format!(
                "invalid {field_name} '{raw}'; expected finite number"
            ))),
        }
    };

    let cx = parse_f64(tokens[1], "x_center")?;
    let cy = parse_f64(tokens[2], "y_center")?;
    let w = parse_f64(tokens[3], "width")?;
    let h = parse_f64(tokens[4], "height")?;

    let confidence = match tokens.get(5).copied() {
        Some(raw) => {
            let value = parse_f64(raw, "confidence")?;
            if !(0.0..=1.0).contains(&value) {
                return Err(malformed(format!(
                    "confidence {value} is outside [0, 1]"
                )));
            }
            Some(value)
        }
        None => None,
    };

    Ok(Some(LabelRow {
        class_id,
        cx,
        cy,
        w,
        h,
        confidence,
    }))
}

/// Fuzz-only entrypoint for single-line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), PanelscanError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}
