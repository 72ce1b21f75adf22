use std::path::PathBuf;
use thiserror::Error;

use crate::detection::BoxRole;

/// The main error type for panelscan operations.
#[derive(Debug, Error)]
pub enum PanelscanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Label file not found: {path}")]
    LabelFileNotFound { path: PathBuf },

    #[error("Malformed label at {path}:{line}: {message}")]
    MalformedLabel {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Unknown class id {class_id} at {path}:{line}")]
    UnknownClass {
        path: PathBuf,
        line: usize,
        class_id: u32,
    },

    #[error("Degenerate {role} box at index {index}: {message}")]
    DegenerateBox {
        role: BoxRole,
        index: usize,
        message: String,
    },

    #[error("Invalid image size: {message}")]
    InvalidImageSize { message: String },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to parse class map from {path}: {source}")]
    ClassMapParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid classes.txt at {path}: {message}")]
    ClassesTxtInvalid { path: PathBuf, message: String },

    #[error("Invalid link options: {message}")]
    InvalidLinkOptions { message: String },

    #[error("Failed to read job manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse job manifest from {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write CSV to {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{count} job(s) were skipped")]
    JobsSkipped { count: usize },
}
