//! Load and record-level error types

use std::io;
use thiserror::Error;

/// Errors that abort a model load
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unsupported model format: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),

    #[error("texture error: {0}")]
    Texture(#[from] image::ImageError),
}

/// Result type alias for model loading
pub type Result<T> = std::result::Result<T, ModelError>;

/// A single line or record that could not be parsed
///
/// Parsers never propagate these; they log and skip the record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct RecordError {
    /// 1-based line number in the source text
    pub line: usize,
    pub reason: String,
}

impl RecordError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}
