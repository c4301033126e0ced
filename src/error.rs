//! Error types for the mesh converter.

use thiserror::Error;

/// Result type alias using ConvertError.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Main error type for conversion operations.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read or process an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A decoded input record violated a structural invariant.
    ///
    /// Parallel-array length mismatches and out-of-range vertex indices
    /// indicate an upstream decoding defect; the conversion aborts rather
    /// than emit a malformed artifact.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Failed to export the assembled artifact.
    #[error("Export error: {0}")]
    Export(String),
}
